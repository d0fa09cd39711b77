use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Read-only view of a product at the moment a forecast is requested.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub current_stock: u32,
    pub reorder_level: u32,
    /// Purchase cost per unit, when known
    #[serde(default)]
    pub cost_price: Option<Decimal>,
    /// Selling price, used for cost estimates when no cost price is recorded
    #[serde(default)]
    pub price_fallback: Option<Decimal>,
    /// Supplier lead time; the configured default applies when absent
    #[serde(default)]
    pub lead_time_days: Option<u32>,
}

impl ProductSnapshot {
    pub fn new(id: Uuid, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
            current_stock: 0,
            reorder_level: 0,
            cost_price: None,
            price_fallback: None,
            lead_time_days: None,
        }
    }

    pub fn with_stock(mut self, current_stock: u32, reorder_level: u32) -> Self {
        self.current_stock = current_stock;
        self.reorder_level = reorder_level;
        self
    }

    pub fn with_cost_price(mut self, cost_price: Decimal) -> Self {
        self.cost_price = Some(cost_price);
        self
    }

    pub fn with_price_fallback(mut self, price: Decimal) -> Self {
        self.price_fallback = Some(price);
        self
    }

    pub fn with_lead_time(mut self, days: u32) -> Self {
        self.lead_time_days = Some(days);
        self
    }

    /// Unit cost used for reorder estimates: cost price, else the fallback
    /// price, else zero.
    pub fn unit_cost(&self) -> Decimal {
        self.cost_price
            .or(self.price_fallback)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn lead_time_or(&self, default_days: u32) -> u32 {
        self.lead_time_days.unwrap_or(default_days)
    }

    /// Rejects snapshots whose prices would poison the cost estimate.
    pub fn validate_prices(&self) -> Result<(), ServiceError> {
        for (label, price) in [
            ("cost_price", self.cost_price),
            ("price_fallback", self.price_fallback),
        ] {
            if let Some(p) = price {
                if p < Decimal::ZERO {
                    return Err(ServiceError::InvalidInput(format!(
                        "product {} has negative {}: {}",
                        self.id, label, p
                    )));
                }
            }
        }
        Ok(())
    }
}
