//! Data types flowing through the forecasting pipeline.

pub mod forecast_result;
pub mod product_snapshot;
pub mod sale_record;

pub use forecast_result::{
    DemandLevel, ForecastPoint, ForecastResult, ReorderSuggestion, Seasonality,
    SeasonalityMethod, StockDays, Trend, TrendLabel, Urgency,
};
pub use product_snapshot::ProductSnapshot;
pub use sale_record::SaleRecord;
