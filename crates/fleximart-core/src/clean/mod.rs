//! Per-entity transform stages. Each cleaner is a pure function from raw
//! rows to `(cleaned rows, counters)`; nothing here touches the database.

pub mod customers;
pub mod products;
pub mod sales;

pub use customers::{clean_customers, CustomerCounters};
pub use products::{clean_products, ProductCounters};
pub use sales::{clean_sales, SaleCounters};
