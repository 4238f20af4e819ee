use std::collections::HashSet;

use serde::Serialize;
use tracing::info;

use crate::normalize::{parse_date, parse_number, round2, title_case};
use crate::types::{CleanSale, RawRecord};

#[derive(Debug, Clone, Default, Serialize)]
pub struct SaleCounters {
    pub raw: usize,
    pub duplicates_removed: usize,
    pub missing_customer_id: usize,
    pub missing_product_id: usize,
}

/// Clean raw sales rows: normalize date and status, coerce the numeric
/// fields, deduplicate by transaction id, and compute the line subtotal.
///
/// Missing customer/product ids are only counted here; resolving them to
/// the sentinel dimension rows happens at load time.
pub fn clean_sales(rows: &[RawRecord]) -> (Vec<CleanSale>, SaleCounters) {
    let mut counters = SaleCounters {
        raw: rows.len(),
        ..Default::default()
    };

    let mut seen_ids = HashSet::new();
    let mut sales = Vec::new();
    for row in rows {
        let external_id = row.get("transaction_id").unwrap_or("").to_string();
        if !seen_ids.insert(external_id.clone()) {
            counters.duplicates_removed += 1;
            continue;
        }

        let status = match row.get("status").map(title_case) {
            // title-cased spellings of "no value" count as missing too
            None => "Pending".to_string(),
            Some(status) if status == "Nan" || status == "None" || status == "Null" => {
                "Pending".to_string()
            }
            Some(status) => status,
        };
        let quantity = row
            .get("quantity")
            .and_then(parse_number)
            .unwrap_or(0.0)
            .max(0.0) as i64;
        let unit_price = row
            .get("unit_price")
            .and_then(parse_number)
            .unwrap_or(0.0)
            .max(0.0);

        sales.push(CleanSale {
            external_id,
            customer_external_id: row.get("customer_id").map(str::to_string),
            product_external_id: row.get("product_id").map(str::to_string),
            transaction_date: row.get("transaction_date").and_then(parse_date),
            status,
            quantity,
            unit_price,
            subtotal: round2(quantity as f64 * unit_price),
        });
    }

    counters.missing_customer_id = sales
        .iter()
        .filter(|s| s.customer_external_id.is_none())
        .count();
    counters.missing_product_id = sales
        .iter()
        .filter(|s| s.product_external_id.is_none())
        .count();

    info!(
        raw = counters.raw,
        kept = sales.len(),
        duplicates_removed = counters.duplicates_removed,
        missing_customer_id = counters.missing_customer_id,
        missing_product_id = counters.missing_product_id,
        "Cleaned sales"
    );

    (sales, counters)
}
