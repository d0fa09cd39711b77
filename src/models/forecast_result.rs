use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Coarse demand bucket derived from the daily average.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
    AsRefStr,
)]
pub enum DemandLevel {
    None,
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
pub enum TrendLabel {
    Increasing,
    Stable,
    Declining,
}

/// Momentum between the two most recent weekly windows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub label: TrendLabel,
    /// Raw relative change; 1.0 means +100%
    pub percentage: f64,
}

impl Trend {
    pub fn stable() -> Self {
        Self {
            label: TrendLabel::Stable,
            percentage: 0.0,
        }
    }
}

/// Which tier of the seasonality detector produced the result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SeasonalityMethod {
    Dynamic,
    DynamicNoPattern,
    StaticCategory,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Seasonality {
    pub is_seasonal: bool,
    /// Multiplier for the current month, within [0.6, 1.8]
    pub factor: f64,
    pub peak_months: Vec<u32>,
    pub low_months: Vec<u32>,
    pub confidence: f64,
    pub method: SeasonalityMethod,
}

impl Seasonality {
    pub fn neutral(method: SeasonalityMethod, confidence: f64) -> Self {
        Self {
            is_seasonal: false,
            factor: 1.0,
            peak_months: Vec::new(),
            low_months: Vec::new(),
            confidence,
            method,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_demand: f64,
}

/// Days until the current stock runs out at the observed rate. A product
/// with no recent consumption never runs out, which is reported as
/// `Unbounded` rather than an infinite float.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "days", rename_all = "snake_case")]
pub enum StockDays {
    Finite(f64),
    Unbounded,
}

impl StockDays {
    pub fn from_rate(current_stock: u32, daily_rate: f64) -> Self {
        if daily_rate > 0.0 && daily_rate.is_finite() {
            StockDays::Finite(f64::from(current_stock) / daily_rate)
        } else {
            StockDays::Unbounded
        }
    }

    /// True when the stock lasts no longer than `days`
    pub fn at_most(&self, days: f64) -> bool {
        match self {
            StockDays::Finite(d) => *d <= days,
            StockDays::Unbounded => false,
        }
    }

    pub fn as_finite(&self) -> Option<f64> {
        match self {
            StockDays::Finite(d) => Some(*d),
            StockDays::Unbounded => None,
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReorderSuggestion {
    pub should_reorder: bool,
    pub urgency: Urgency,
    pub suggested_quantity: u32,
    pub days_until_stockout: StockDays,
    pub estimated_cost: Decimal,
    pub message: String,
    /// Replenishment policy that produced the suggestion
    pub policy: String,
}

/// Everything computed for one product in one call. Never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub product_id: Uuid,
    pub product_name: String,
    pub daily_average: f64,
    pub weekly_average: f64,
    pub monthly_average: f64,
    pub demand_level: DemandLevel,
    pub trend: Trend,
    pub seasonality: Seasonality,
    pub daily_forecast: Vec<ForecastPoint>,
    pub total_forecast: u64,
    pub low_estimate: u64,
    pub high_estimate: u64,
    pub confidence: f64,
    pub reorder_suggestion: ReorderSuggestion,
}
