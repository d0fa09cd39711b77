/*!
 * # Demand Forecasting
 *
 * The pure pipeline behind every forecast. Data flows one way:
 *
 * ```text
 * sale records ─┬─ usage ────────┐
 *               ├─ trend ────────┼─ generator ─ replenishment
 *               ├─ seasonality ──┘
 *               └─ confidence
 * ```
 *
 * Nothing here performs I/O or keeps state between calls; see
 * [`crate::services::forecasting`] for fetching and batching.
 */

pub mod confidence;
pub mod engine;
pub mod generator;
pub mod replenishment;
pub mod seasonality;
pub mod trend;
pub mod usage;

pub use confidence::score_confidence;
pub use engine::ForecastEngine;
pub use generator::{ForecastGenerator, ForecastOutput};
pub use replenishment::{
    policy_from_config, DynamicSeasonalPolicy, EoqSafetyStockPolicy, MovingAveragePolicy,
    ReplenishmentAdvisor, ReplenishmentContext, ReplenishmentPolicy,
};
pub use seasonality::{MonthlyProfile, SeasonalityDetector};
pub use trend::{classify_trend, detect_trend};
pub use usage::{average_daily_usage, classify_demand, UsageAverages};
