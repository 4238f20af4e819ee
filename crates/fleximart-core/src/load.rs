//! Loads cleaned datasets into the target store.
//!
//! Everything runs inside one transaction on one connection: committed on
//! success, rolled back on any error path. Dimension rows are resolved by
//! natural key (lookup, insert on miss) and never updated once present,
//! which is what makes re-runs idempotent for customers and products.
//! Every surviving sale always becomes one new order plus one order item.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::{Postgres, Transaction};
use tracing::info;

use crate::db::DbPool;
use crate::error::Result;
use crate::types::{CleanCustomer, CleanProduct, CleanSale};

pub const UNKNOWN_CUSTOMER_EMAIL: &str = "unknown.customer@fleximart.local";
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown Product";
pub const UNKNOWN_PRODUCT_CATEGORY: &str = "Electronics";

#[derive(Debug, Clone, Copy)]
struct SentinelIds {
    customer_id: i64,
    product_id: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadSummary {
    pub customers_inserted: usize,
    pub products_inserted: usize,
    pub orders_inserted: usize,
    pub order_items_inserted: usize,
}

pub async fn load_all(
    pool: &DbPool,
    customers: &[CleanCustomer],
    products: &[CleanProduct],
    sales: &[CleanSale],
) -> Result<LoadSummary> {
    let mut tx = pool.begin().await?;
    let mut summary = LoadSummary::default();

    let sentinels = ensure_unknown_rows(&mut tx).await?;

    let customer_ids = resolve_customers(&mut tx, customers, &mut summary).await?;
    let product_ids = resolve_products(&mut tx, products, &mut summary).await?;
    insert_facts(&mut tx, sales, &customer_ids, &product_ids, sentinels, &mut summary).await?;

    tx.commit().await?;

    info!(
        customers_inserted = summary.customers_inserted,
        products_inserted = summary.products_inserted,
        orders_inserted = summary.orders_inserted,
        order_items_inserted = summary.order_items_inserted,
        "Load committed"
    );

    Ok(summary)
}

/// Lookup-or-create the two sentinel dimension rows that absorb facts
/// whose customer/product cannot be matched, and capture their ids.
async fn ensure_unknown_rows(tx: &mut Transaction<'_, Postgres>) -> Result<SentinelIds> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM customers WHERE email = $1")
        .bind(UNKNOWN_CUSTOMER_EMAIL)
        .fetch_optional(&mut **tx)
        .await?;
    let customer_id = match existing {
        Some(id) => id,
        None => {
            sqlx::query_scalar(
                r#"
                INSERT INTO customers (first_name, last_name, email, phone, city, registration_date)
                VALUES ('Unknown', 'Customer', $1, NULL, NULL, NULL)
                RETURNING id
                "#,
            )
            .bind(UNKNOWN_CUSTOMER_EMAIL)
            .fetch_one(&mut **tx)
            .await?
        }
    };

    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM products WHERE product_name = $1 AND category = $2")
            .bind(UNKNOWN_PRODUCT_NAME)
            .bind(UNKNOWN_PRODUCT_CATEGORY)
            .fetch_optional(&mut **tx)
            .await?;
    let product_id = match existing {
        Some(id) => id,
        None => {
            sqlx::query_scalar(
                r#"
                INSERT INTO products (product_name, category, price, stock_quantity)
                VALUES ($1, $2, 0.00, 0)
                RETURNING id
                "#,
            )
            .bind(UNKNOWN_PRODUCT_NAME)
            .bind(UNKNOWN_PRODUCT_CATEGORY)
            .fetch_one(&mut **tx)
            .await?
        }
    };

    Ok(SentinelIds {
        customer_id,
        product_id,
    })
}

/// Resolve each cleaned customer against the store by email, inserting on
/// miss. Existing matches are reused verbatim. Returns the external-id to
/// database-id mapping used for fact construction.
async fn resolve_customers(
    tx: &mut Transaction<'_, Postgres>,
    customers: &[CleanCustomer],
    summary: &mut LoadSummary,
) -> Result<HashMap<String, i64>> {
    let mut mapping = HashMap::with_capacity(customers.len());
    for customer in customers {
        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM customers WHERE email = $1")
            .bind(&customer.email)
            .fetch_optional(&mut **tx)
            .await?;

        let id = match existing {
            Some(id) => id,
            None => {
                let id = sqlx::query_scalar(
                    r#"
                    INSERT INTO customers (first_name, last_name, email, phone, city, registration_date)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING id
                    "#,
                )
                .bind(&customer.first_name)
                .bind(&customer.last_name)
                .bind(&customer.email)
                .bind(&customer.phone)
                .bind(&customer.city)
                .bind(customer.registration_date)
                .fetch_one(&mut **tx)
                .await?;
                summary.customers_inserted += 1;
                id
            }
        };

        mapping.insert(customer.external_id.clone(), id);
    }
    Ok(mapping)
}

/// Same pattern as customers, keyed by the `(product_name, category)` pair.
async fn resolve_products(
    tx: &mut Transaction<'_, Postgres>,
    products: &[CleanProduct],
    summary: &mut LoadSummary,
) -> Result<HashMap<String, i64>> {
    let mut mapping = HashMap::with_capacity(products.len());
    for product in products {
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM products WHERE product_name = $1 AND category = $2")
                .bind(&product.product_name)
                .bind(&product.category)
                .fetch_optional(&mut **tx)
                .await?;

        let id = match existing {
            Some(id) => id,
            None => {
                let id = sqlx::query_scalar(
                    r#"
                    INSERT INTO products (product_name, category, price, stock_quantity)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id
                    "#,
                )
                .bind(&product.product_name)
                .bind(&product.category)
                .bind(product.price)
                .bind(product.stock_quantity)
                .fetch_one(&mut **tx)
                .await?;
                summary.products_inserted += 1;
                id
            }
        };

        mapping.insert(product.external_id.clone(), id);
    }
    Ok(mapping)
}

/// One order and exactly one order item per cleaned sale. Sales are never
/// deduplicated against previously persisted orders, so re-runs append.
async fn insert_facts(
    tx: &mut Transaction<'_, Postgres>,
    sales: &[CleanSale],
    customer_ids: &HashMap<String, i64>,
    product_ids: &HashMap<String, i64>,
    sentinels: SentinelIds,
    summary: &mut LoadSummary,
) -> Result<()> {
    for sale in sales {
        let customer_id = resolve_dimension(
            customer_ids,
            sale.customer_external_id.as_deref(),
            sentinels.customer_id,
        );
        let product_id = resolve_dimension(
            product_ids,
            sale.product_external_id.as_deref(),
            sentinels.product_id,
        );

        // NaiveDate::default() is 1970-01-01, the fixed epoch fallback.
        let order_date = sale.transaction_date.unwrap_or_default();

        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (customer_id, order_date, total_amount, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(customer_id)
        .bind(order_date)
        .bind(sale.subtotal)
        .bind(&sale.status)
        .fetch_one(&mut **tx)
        .await?;
        summary.orders_inserted += 1;

        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price, subtotal)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order_id)
        .bind(product_id)
        .bind(sale.quantity)
        .bind(sale.unit_price)
        .bind(sale.subtotal)
        .execute(&mut **tx)
        .await?;
        summary.order_items_inserted += 1;
    }
    Ok(())
}

/// Map an external id to its database id; anything unmapped (never seen,
/// or null in the source) resolves to the sentinel row.
fn resolve_dimension(
    mapping: &HashMap<String, i64>,
    external_id: Option<&str>,
    sentinel_id: i64,
) -> i64 {
    external_id
        .and_then(|id| mapping.get(id).copied())
        .unwrap_or(sentinel_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_or_null_external_ids_resolve_to_sentinel() {
        let mapping = HashMap::from([("C001".to_string(), 7_i64)]);

        assert_eq!(resolve_dimension(&mapping, Some("C001"), 99), 7);
        assert_eq!(resolve_dimension(&mapping, Some("C999"), 99), 99);
        assert_eq!(resolve_dimension(&mapping, None, 99), 99);
    }
}
