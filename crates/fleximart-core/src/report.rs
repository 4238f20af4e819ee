//! The data quality report assembled from the per-stage counters.

use std::fmt::Write;

use serde::Serialize;

use crate::clean::{CustomerCounters, ProductCounters, SaleCounters};
use crate::load::LoadSummary;

#[derive(Debug, Clone, Default, Serialize)]
pub struct QualityReport {
    pub customers: CustomerCounters,
    pub products: ProductCounters,
    pub sales: SaleCounters,
    /// Cleaned row counts handed to the load stage.
    pub customers_loaded: usize,
    pub products_loaded: usize,
    pub sales_loaded: usize,
    /// Present only when the load stage ran.
    pub load: Option<LoadSummary>,
}

impl QualityReport {
    pub fn render(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "FLEXIMART DATA QUALITY REPORT");
        let _ = writeln!(out, "{}", "=".repeat(40));
        let _ = writeln!(out);

        let _ = writeln!(out, "Customers Dataset");
        let _ = writeln!(out, "{}", "-".repeat(20));
        let _ = writeln!(out, "Raw records processed           : {}", self.customers.raw);
        let _ = writeln!(out, "Duplicate records removed       : {}", self.customers.duplicates_removed);
        let _ = writeln!(out, "Missing email values handled    : {}", self.customers.missing_email_handled);
        let _ = writeln!(out, "Records loaded successfully     : {}", self.customers_loaded);
        let _ = writeln!(out);

        let _ = writeln!(out, "Products Dataset");
        let _ = writeln!(out, "{}", "-".repeat(20));
        let _ = writeln!(out, "Raw records processed           : {}", self.products.raw);
        let _ = writeln!(out, "Duplicate records removed       : {}", self.products.duplicates_removed);
        let _ = writeln!(out, "Missing price values handled    : {}", self.products.missing_price_handled);
        let _ = writeln!(out, "Null stock values handled       : {}", self.products.null_stock_handled);
        let _ = writeln!(out, "Records loaded successfully     : {}", self.products_loaded);
        let _ = writeln!(out);

        let _ = writeln!(out, "Sales Dataset");
        let _ = writeln!(out, "{}", "-".repeat(20));
        let _ = writeln!(out, "Raw records processed           : {}", self.sales.raw);
        let _ = writeln!(out, "Duplicate records removed       : {}", self.sales.duplicates_removed);
        let _ = writeln!(
            out,
            "Missing customer IDs            : {} (mapped to Unknown Customer)",
            self.sales.missing_customer_id
        );
        let _ = writeln!(
            out,
            "Missing product IDs             : {} (mapped to Unknown Product)",
            self.sales.missing_product_id
        );
        let _ = writeln!(out, "Records loaded successfully     : {}", self.sales_loaded);
        let _ = writeln!(out);

        if let Some(load) = &self.load {
            let _ = writeln!(out, "Load Stage");
            let _ = writeln!(out, "{}", "-".repeat(20));
            let _ = writeln!(out, "New customer rows inserted      : {}", load.customers_inserted);
            let _ = writeln!(out, "New product rows inserted       : {}", load.products_inserted);
            let _ = writeln!(out, "Orders inserted                 : {}", load.orders_inserted);
            let _ = writeln!(out, "Order items inserted            : {}", load.order_items_inserted);
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "{}", "-".repeat(40));
        let _ = writeln!(out, "ETL PROCESS COMPLETED");
        let _ = writeln!(out, "{}", "-".repeat(40));

        out
    }

    /// Report body for a failed run; written in place of the success
    /// summary before the process exits non-zero.
    pub fn render_failure(reason: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "FLEXIMART DATA QUALITY REPORT");
        let _ = writeln!(out, "{}", "=".repeat(40));
        let _ = writeln!(out);
        let _ = writeln!(out, "ETL FAILED");
        let _ = writeln!(out, "Reason: {reason}");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_every_counter_section() {
        let report = QualityReport {
            customers: CustomerCounters {
                raw: 10,
                duplicates_removed: 1,
                missing_email_handled: 2,
            },
            products: ProductCounters {
                raw: 8,
                duplicates_removed: 0,
                missing_price_handled: 3,
                null_stock_handled: 1,
            },
            sales: SaleCounters {
                raw: 20,
                duplicates_removed: 2,
                missing_customer_id: 1,
                missing_product_id: 0,
            },
            customers_loaded: 9,
            products_loaded: 8,
            sales_loaded: 18,
            load: Some(LoadSummary {
                customers_inserted: 9,
                products_inserted: 8,
                orders_inserted: 18,
                order_items_inserted: 18,
            }),
        };

        let text = report.render();
        assert!(text.starts_with("FLEXIMART DATA QUALITY REPORT"));
        assert!(text.contains("Customers Dataset"));
        assert!(text.contains("Missing email values handled    : 2"));
        assert!(text.contains("Missing customer IDs            : 1 (mapped to Unknown Customer)"));
        assert!(text.contains("Orders inserted                 : 18"));
        assert!(text.contains("ETL PROCESS COMPLETED"));
    }

    #[test]
    fn skipped_load_omits_the_load_section() {
        let report = QualityReport::default();
        let text = report.render();
        assert!(!text.contains("Load Stage"));
    }

    #[test]
    fn failure_report_names_the_reason() {
        let text = QualityReport::render_failure("Missing input file: data/sales_raw.csv");
        assert!(text.contains("ETL FAILED"));
        assert!(text.contains("data/sales_raw.csv"));
    }
}
