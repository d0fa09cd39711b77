use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";

/// Daily-average cut-offs for the demand level buckets
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
#[validate(schema(function = "validate_demand_thresholds"))]
pub struct DemandThresholds {
    /// Units per day at or above which demand is High
    #[validate(range(min = 0.0))]
    pub high_threshold: f64,
    /// Units per day at or above which demand is Medium
    #[validate(range(min = 0.0))]
    pub medium_threshold: f64,
}

impl Default for DemandThresholds {
    fn default() -> Self {
        Self {
            high_threshold: 10.0,
            medium_threshold: 3.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct TrendConfig {
    /// Relative change at which momentum counts as increasing/declining
    #[validate(range(min = 0.0, max = 10.0))]
    pub threshold: f64,
    /// Length of each of the two compared windows
    #[validate(range(min = 1, max = 90))]
    pub window_days: u32,
    /// Cap applied to the change before it is used as a forecast multiplier
    #[validate(range(min = 0.0, max = 1.0))]
    pub max_adjustment: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            threshold: 0.15,
            window_days: 7,
            max_adjustment: 0.5,
        }
    }
}

/// Static seasonality entry for a product category
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategorySeasonality {
    pub seasonal: bool,
    pub peak_months: Vec<u32>,
}

impl CategorySeasonality {
    pub fn seasonal(peak_months: &[u32]) -> Self {
        Self {
            seasonal: true,
            peak_months: peak_months.to_vec(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct SeasonalityConfig {
    /// Minimum sale records before the dynamic detector is trusted
    pub min_records: usize,
    /// Minimum distinct calendar months with sales
    #[validate(range(min = 1, max = 12))]
    pub min_months: usize,
    #[validate(range(min = 0.0))]
    pub peak_threshold: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub low_threshold: f64,
    /// Deviation below which the current month damps the forecast
    #[validate(range(min = 0.0, max = 1.0))]
    pub low_factor_threshold: f64,
    #[validate(range(min = 0.0))]
    pub cv_threshold: f64,
    #[validate(range(min = 1, max = 12))]
    pub min_peak_months: usize,
    /// Dynamic results below this confidence defer to the category table
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence_cutoff: f64,
    #[validate(range(min = 1.0))]
    pub peak_factor_max: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub low_factor_min: f64,
    pub static_peak_factor: f64,
    pub static_off_peak_factor: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub static_confidence: f64,
    /// Category name (normalized, see [`normalize_category`]) to static pattern
    #[validate(custom = "validate_category_table")]
    pub categories: HashMap<String, CategorySeasonality>,
}

impl Default for SeasonalityConfig {
    fn default() -> Self {
        let categories = [
            ("respiratory", CategorySeasonality::seasonal(&[11, 12, 1, 2])),
            ("cold_flu", CategorySeasonality::seasonal(&[10, 11, 12, 1, 2])),
            ("allergy", CategorySeasonality::seasonal(&[3, 4, 5, 6])),
            ("sun_care", CategorySeasonality::seasonal(&[5, 6, 7, 8])),
            ("vitamins", CategorySeasonality::seasonal(&[10, 11, 12, 1])),
            ("analgesics", CategorySeasonality::default()),
            ("first_aid", CategorySeasonality::default()),
        ]
        .into_iter()
        .map(|(name, entry)| (name.to_string(), entry))
        .collect();

        Self {
            min_records: 100,
            min_months: 6,
            peak_threshold: 0.30,
            low_threshold: 0.30,
            low_factor_threshold: 0.20,
            cv_threshold: 0.25,
            min_peak_months: 2,
            confidence_cutoff: 0.6,
            peak_factor_max: 1.8,
            low_factor_min: 0.6,
            static_peak_factor: 1.3,
            static_off_peak_factor: 0.9,
            static_confidence: 0.7,
            categories,
        }
    }
}

impl SeasonalityConfig {
    /// Looks up the static pattern for a category, ignoring case and punctuation.
    pub fn category(&self, name: &str) -> Option<&CategorySeasonality> {
        let key = normalize_category(name);
        self.categories
            .iter()
            .find(|(k, _)| normalize_category(k) == key)
            .map(|(_, v)| v)
    }
}

/// "Cold & Flu" and "cold-flu" both become "cold_flu"
pub fn normalize_category(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// How the low/high estimates around the point forecast are derived
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntervalMethod {
    /// Flat percentage band around the total
    Fixed,
    /// Band from the standard deviation of historical daily totals
    Variance,
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastSettings {
    #[validate(range(min = 1, max = 365))]
    pub horizon_days: u32,
    #[validate(range(min = 1, max = 365))]
    pub usage_window_days: u32,
    /// Half-width of the multiplicative daily jitter; 0.1 gives [0.9, 1.1]
    #[validate(range(min = 0.0, max = 0.5))]
    pub jitter: f64,
    /// Fixed seed for reproducible jitter
    pub seed: Option<u64>,
    pub interval: IntervalMethod,
    #[validate(range(min = 0.0, max = 1.0))]
    pub interval_percent: f64,
    #[validate(range(min = 0.0))]
    pub interval_z: f64,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            horizon_days: 30,
            usage_window_days: 30,
            jitter: 0.1,
            seed: None,
            interval: IntervalMethod::Fixed,
            interval_percent: 0.2,
            interval_z: 1.28,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplenishmentPolicyKind {
    MovingAverage,
    EoqSafetyStock,
    DynamicSeasonal,
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct ReplenishmentConfig {
    #[validate(range(min = 1, max = 365))]
    pub default_lead_time_days: u32,
    /// Days of demand a reorder should cover
    #[validate(range(min = 1, max = 365))]
    pub coverage_days: u32,
    pub high_urgency_days: f64,
    pub medium_urgency_days: f64,
    pub policy: ReplenishmentPolicyKind,
    /// Fixed cost of placing one order (EOQ)
    #[validate(range(min = 0.0))]
    pub ordering_cost: f64,
    /// Yearly holding cost as a fraction of unit cost (EOQ)
    #[validate(range(min = 0.0, max = 10.0))]
    pub holding_cost_rate: f64,
    /// Service-level z score for safety stock
    #[validate(range(min = 0.0, max = 5.0))]
    pub service_level_z: f64,
}

impl Default for ReplenishmentConfig {
    fn default() -> Self {
        Self {
            default_lead_time_days: 7,
            coverage_days: 30,
            high_urgency_days: 3.0,
            medium_urgency_days: 7.0,
            policy: ReplenishmentPolicyKind::MovingAverage,
            ordering_cost: 25.0,
            holding_cost_rate: 0.25,
            service_level_z: 1.65,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// History fetched for usage, trend and confidence
    #[validate(range(min = 14, max = 3650))]
    pub history_lookback_days: u32,
    /// History fetched for month-of-year seasonality
    #[validate(range(min = 30, max = 3650))]
    pub seasonality_lookback_days: u32,
    #[validate(range(min = 1, max = 1024))]
    pub max_concurrency: usize,
    #[validate(range(min = 1))]
    pub per_product_timeout_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            history_lookback_days: 90,
            seasonality_lookback_days: 730,
            max_concurrency: 8,
            per_product_timeout_ms: 5_000,
        }
    }
}

impl BatchConfig {
    pub fn per_product_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.per_product_timeout_ms)
    }
}

/// Forecasting engine configuration
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ForecastConfig {
    #[serde(default)]
    #[validate]
    pub demand: DemandThresholds,

    #[serde(default)]
    #[validate]
    pub trend: TrendConfig,

    #[serde(default)]
    #[validate]
    pub seasonality: SeasonalityConfig,

    #[serde(default)]
    #[validate]
    pub forecast: ForecastSettings,

    #[serde(default)]
    #[validate]
    pub replenishment: ReplenishmentConfig,

    #[serde(default)]
    #[validate]
    pub batch: BatchConfig,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            demand: DemandThresholds::default(),
            trend: TrendConfig::default(),
            seasonality: SeasonalityConfig::default(),
            forecast: ForecastSettings::default(),
            replenishment: ReplenishmentConfig::default(),
            batch: BatchConfig::default(),
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn validate_demand_thresholds(t: &DemandThresholds) -> Result<(), ValidationError> {
    if t.medium_threshold > t.high_threshold {
        let mut err = ValidationError::new("demand_thresholds");
        err.message = Some("medium_threshold must not exceed high_threshold".into());
        return Err(err);
    }
    Ok(())
}

fn validate_category_table(
    table: &HashMap<String, CategorySeasonality>,
) -> Result<(), ValidationError> {
    for (name, entry) in table {
        if entry.peak_months.iter().any(|m| !(1..=12).contains(m)) {
            let mut err = ValidationError::new("peak_months");
            err.message = Some(format!("category '{}' has a month outside 1..=12", name).into());
            return Err(err);
        }
    }
    Ok(())
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("pharmacy_forecast={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

/// Loads configuration from the `config/` directory next to the working directory.
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<ForecastConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    load_config_from(Path::new(CONFIG_DIR), &run_env)
}

pub fn load_config_from(dir: &Path, run_env: &str) -> Result<ForecastConfig, AppConfigError> {
    info!("Loading forecast configuration for environment: {}", run_env);

    if !dir.exists() {
        info!(
            "Config directory '{}' not found; using built-in defaults and environment",
            dir.display()
        );
    }

    let config = Config::builder()
        .add_source(File::with_name(&dir.join("default").to_string_lossy()).required(false))
        .add_source(File::with_name(&dir.join(run_env).to_string_lossy()).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let forecast_config: ForecastConfig = config.try_deserialize()?;

    forecast_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(forecast_config)
}
