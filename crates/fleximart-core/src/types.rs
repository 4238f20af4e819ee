use chrono::NaiveDate;
use serde::Serialize;

/// One row of an extracted file: column name to value, in file order.
/// Values are already trimmed, with blanks and missing-value sentinels
/// collapsed to `None`. No type guarantees beyond that.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    columns: Vec<(String, Option<String>)>,
}

impl RawRecord {
    pub fn new(columns: Vec<(String, Option<String>)>) -> Self {
        Self { columns }
    }

    pub fn from_pairs<const N: usize>(pairs: [(&str, Option<&str>); N]) -> Self {
        Self {
            columns: pairs
                .into_iter()
                .map(|(name, value)| (name.to_string(), value.map(str::to_string)))
                .collect(),
        }
    }

    /// Value of the named column, if the column exists and is non-null.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }
}

/// The three raw datasets handed over by the extract stage.
#[derive(Debug, Default)]
pub struct RawDatasets {
    pub customers: Vec<RawRecord>,
    pub products: Vec<RawRecord>,
    pub sales: Vec<RawRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanCustomer {
    /// Natural key from the source system (empty when the source row had none).
    pub external_id: String,
    pub first_name: String,
    pub last_name: String,
    /// Non-null and globally unique after cleaning; either a validated
    /// original or a generated placeholder.
    pub email: String,
    /// Canonical `+91XXXXXXXXXX` or None.
    pub phone: Option<String>,
    pub city: Option<String>,
    pub registration_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanProduct {
    pub external_id: String,
    pub product_name: String,
    pub category: String,
    /// Non-null, >= 0, rounded to 2 decimals.
    pub price: f64,
    pub stock_quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanSale {
    /// Transaction id; the dedup key.
    pub external_id: String,
    pub customer_external_id: Option<String>,
    pub product_external_id: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub status: String,
    pub quantity: i64,
    pub unit_price: f64,
    /// `round2(quantity * unit_price)`, computed at cleaning time.
    pub subtotal: f64,
}
