use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single sale line for one product, as supplied by the record store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub timestamp: DateTime<Utc>,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl SaleRecord {
    pub fn new(timestamp: DateTime<Utc>, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            timestamp,
            quantity,
            unit_price,
        }
    }

    /// Calendar day of the sale (UTC)
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn quantity_f64(&self) -> f64 {
        f64::from(self.quantity)
    }
}

/// Sorts records by timestamp ascending. The store contract only promises
/// an orderable sequence, so every pipeline entry point normalizes first.
pub fn sort_by_timestamp(records: &mut [SaleRecord]) {
    records.sort_by_key(|r| r.timestamp);
}
