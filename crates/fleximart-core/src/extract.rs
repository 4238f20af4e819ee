//! Reads the three raw CSV files into [`RawRecord`] rows.
//!
//! String noise is reduced here once so the cleaners never see it: every
//! field is trimmed, and blanks or missing-value sentinels become None.

use std::path::Path;

use tracing::info;

use crate::error::{PipelineError, Result};
use crate::types::{RawDatasets, RawRecord};

const CUSTOMERS_FILE: &str = "customers_raw.csv";
const PRODUCTS_FILE: &str = "products_raw.csv";
const SALES_FILE: &str = "sales_raw.csv";

/// Literal strings that mean "no value" in the source exports.
const MISSING_SENTINELS: &[&str] = &["", "nan", "NaN", "NAN", "None", "none", "null", "NULL"];

/// Read all three raw datasets. A missing file is fatal and reported before
/// any transform work begins.
pub fn extract_all(data_dir: &Path) -> Result<RawDatasets> {
    let customers = read_raw_csv(&data_dir.join(CUSTOMERS_FILE))?;
    let products = read_raw_csv(&data_dir.join(PRODUCTS_FILE))?;
    let sales = read_raw_csv(&data_dir.join(SALES_FILE))?;

    info!(
        customers = customers.len(),
        products = products.len(),
        sales = sales.len(),
        "Extracted raw datasets"
    );

    Ok(RawDatasets {
        customers,
        products,
        sales,
    })
}

/// Read one CSV file into raw rows, preserving column order.
pub fn read_raw_csv(path: &Path) -> Result<Vec<RawRecord>> {
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.display().to_string()));
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let columns = headers
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), clean_field(record.get(index))))
            .collect();
        rows.push(RawRecord::new(columns));
    }

    Ok(rows)
}

fn clean_field(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if MISSING_SENTINELS.contains(&trimmed) {
        return None;
    }
    Some(trimmed.to_string())
}
