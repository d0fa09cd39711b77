//! Single-product pipeline: history in, [`ForecastResult`] out.

use chrono::{DateTime, Datelike, Duration, Utc};
use tracing::debug;

use crate::config::ForecastConfig;
use crate::errors::ServiceError;
use crate::forecasting::confidence::{daily_std_dev, score_confidence};
use crate::forecasting::generator::{jitter_rng, ForecastGenerator, ForecastOutput};
use crate::forecasting::replenishment::{ReplenishmentAdvisor, ReplenishmentContext};
use crate::forecasting::seasonality::SeasonalityDetector;
use crate::forecasting::trend::detect_trend;
use crate::forecasting::usage::{classify_demand, UsageAverages};
use crate::models::{sale_record, ForecastResult, ProductSnapshot, SaleRecord, Trend};

pub struct ForecastEngine<'a> {
    config: &'a ForecastConfig,
}

impl<'a> ForecastEngine<'a> {
    pub fn new(config: &'a ForecastConfig) -> Self {
        Self { config }
    }

    /// Runs usage, trend, seasonality, confidence, projection and advisory
    /// over one immutable snapshot.
    ///
    /// `history` may extend further back than the usage lookback; the older
    /// part only feeds month-of-year seasonality. Records stamped after `now`
    /// are ignored. No sales inside the usage lookback is not an error: it
    /// yields an all-zero forecast with zero confidence and no reorder.
    pub fn build(
        &self,
        product: &ProductSnapshot,
        history: &[SaleRecord],
        now: DateTime<Utc>,
    ) -> Result<ForecastResult, ServiceError> {
        product.validate_prices()?;
        let cfg = self.config;

        let mut records: Vec<SaleRecord> = history
            .iter()
            .filter(|r| r.timestamp <= now)
            .cloned()
            .collect();
        sale_record::sort_by_timestamp(&mut records);

        let lookback_start = now - Duration::days(i64::from(cfg.batch.history_lookback_days));
        let split = records.partition_point(|r| r.timestamp < lookback_start);
        let recent = &records[split..];

        let usage = UsageAverages::compute(recent, cfg.forecast.usage_window_days, now);
        let seasonality = SeasonalityDetector::new(&cfg.seasonality).detect(
            &records,
            &product.category,
            now.month(),
        );
        let std_dev = daily_std_dev(recent);

        let (trend, projection) = if recent.is_empty() {
            (
                Trend::stable(),
                ForecastOutput::zero(cfg.forecast.horizon_days, now.date_naive()),
            )
        } else {
            let trend = detect_trend(recent, now, &cfg.trend);
            let projection = ForecastGenerator::new(&cfg.forecast, cfg.trend.max_adjustment)
                .generate(
                    usage.daily,
                    &trend,
                    &seasonality,
                    std_dev,
                    now.date_naive(),
                    &mut jitter_rng(product.id, cfg.forecast.seed),
                );
            (trend, projection)
        };

        let confidence = score_confidence(recent, now);

        let reorder_suggestion = ReplenishmentAdvisor::new(&cfg.replenishment).advise(
            &ReplenishmentContext {
                product,
                daily_average: usage.daily,
                adjusted_rate: projection.adjusted_rate,
                daily_std_dev: std_dev,
                lead_time_days: product.lead_time_or(cfg.replenishment.default_lead_time_days),
                has_history: !recent.is_empty(),
            },
        );

        debug!(
            product_id = %product.id,
            daily_average = usage.daily,
            total_forecast = projection.total,
            confidence,
            should_reorder = reorder_suggestion.should_reorder,
            "forecast built"
        );

        Ok(ForecastResult {
            product_id: product.id,
            product_name: product.name.clone(),
            daily_average: usage.daily,
            weekly_average: usage.weekly,
            monthly_average: usage.monthly,
            demand_level: classify_demand(usage.daily, &cfg.demand),
            trend,
            seasonality,
            daily_forecast: projection.daily,
            total_forecast: projection.total,
            low_estimate: projection.low,
            high_estimate: projection.high,
            confidence,
            reorder_suggestion,
        })
    }
}
