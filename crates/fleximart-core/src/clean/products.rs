use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::info;

use crate::normalize::{parse_number, round2, standardize_category};
use crate::types::{CleanProduct, RawRecord};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductCounters {
    pub raw: usize,
    pub duplicates_removed: usize,
    pub missing_price_handled: usize,
    pub null_stock_handled: usize,
}

struct PartialProduct {
    external_id: String,
    product_name: String,
    category: String,
    price: Option<f64>,
    stock: Option<f64>,
}

/// Clean raw product rows: canonicalize category, impute missing prices
/// from category medians (global median, then 0.00, as fallbacks), default
/// and clamp stock, and deduplicate by product id.
///
/// `products.price` is NOT NULL downstream, so imputation never leaves a
/// null price. Medians are taken over the pre-dedup row set.
pub fn clean_products(rows: &[RawRecord]) -> (Vec<CleanProduct>, ProductCounters) {
    let mut counters = ProductCounters {
        raw: rows.len(),
        ..Default::default()
    };

    let mut partials: Vec<PartialProduct> = rows
        .iter()
        .map(|row| PartialProduct {
            external_id: row.get("product_id").unwrap_or("").to_string(),
            product_name: row.get("product_name").unwrap_or("").to_string(),
            category: standardize_category(row.get("category").unwrap_or("")),
            price: row.get("price").and_then(parse_number),
            stock: row.get("stock_quantity").and_then(parse_number),
        })
        .collect();

    counters.missing_price_handled = partials.iter().filter(|p| p.price.is_none()).count();
    counters.null_stock_handled = partials.iter().filter(|p| p.stock.is_none()).count();

    // Known prices per category, plus the global pool for the fallback.
    let mut by_category: HashMap<String, Vec<f64>> = HashMap::new();
    let mut all_prices = Vec::new();
    for partial in &partials {
        if let Some(price) = partial.price {
            by_category
                .entry(partial.category.clone())
                .or_default()
                .push(price);
            all_prices.push(price);
        }
    }
    let global_median = median(&all_prices);

    for partial in &mut partials {
        if partial.price.is_none() {
            let imputed = by_category
                .get(&partial.category)
                .and_then(|prices| median(prices))
                .or(global_median)
                .unwrap_or(0.0);
            partial.price = Some(imputed);
        }
    }

    let mut seen_ids = HashSet::new();
    let mut products = Vec::new();
    for partial in partials {
        if !seen_ids.insert(partial.external_id.clone()) {
            counters.duplicates_removed += 1;
            continue;
        }

        let price = partial.price.unwrap_or(0.0);
        let stock = partial.stock.unwrap_or(0.0).max(0.0) as i64;
        products.push(CleanProduct {
            external_id: partial.external_id,
            product_name: partial.product_name,
            category: partial.category,
            price: round2(price),
            stock_quantity: stock,
        });
    }

    info!(
        raw = counters.raw,
        kept = products.len(),
        duplicates_removed = counters.duplicates_removed,
        missing_price_handled = counters.missing_price_handled,
        null_stock_handled = counters.null_stock_handled,
        "Cleaned products"
    );

    (products, counters)
}

/// Median with pandas semantics: mean of the two middle values for an
/// even-sized set; None for an empty set.
fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}
