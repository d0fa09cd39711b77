/*!
 * # Forecasting Service
 *
 * Entry point for demand forecasts. Fetches a product snapshot and its sale
 * history from a [`SalesDataSource`], runs the forecasting pipeline and
 * offers batch and ranking views across many products.
 *
 * Batch views fan out with bounded concurrency and a per-product timeout. A
 * product that fails or times out is logged and left out of the result; the
 * batch itself never fails.
 */

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::ForecastConfig;
use crate::errors::ServiceError;
use crate::forecasting::ForecastEngine;
use crate::metrics::{
    FORECASTS_GENERATED, FORECAST_DURATION, FORECAST_FAILURES, FORECAST_TIMEOUTS,
    REORDER_SUGGESTIONS,
};
use crate::models::{ForecastResult, TrendLabel};
use crate::repositories::SalesDataSource;

#[derive(Clone)]
pub struct ForecastingService {
    source: Arc<dyn SalesDataSource>,
    config: Arc<ForecastConfig>,
}

impl ForecastingService {
    pub fn new(source: Arc<dyn SalesDataSource>, config: Arc<ForecastConfig>) -> Self {
        Self { source, config }
    }

    /// Forecast for one product as of now
    pub async fn forecast(&self, product_id: Uuid) -> Result<ForecastResult, ServiceError> {
        self.forecast_at(product_id, Utc::now()).await
    }

    /// Forecast for one product as of `now`.
    ///
    /// Unknown products surface as `NotFound`; an empty sale history yields
    /// an all-zero forecast rather than an error.
    #[instrument(skip(self))]
    pub async fn forecast_at(
        &self,
        product_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ForecastResult, ServiceError> {
        let _timer = FORECAST_DURATION.start_timer();

        let product = self.source.product_snapshot(product_id).await?;

        let batch = &self.config.batch;
        let lookback = batch
            .history_lookback_days
            .max(batch.seasonality_lookback_days);
        let since = now - Duration::days(i64::from(lookback));
        let history = self.source.sales_history(product_id, since, now).await?;

        let result = ForecastEngine::new(&self.config).build(&product, &history, now)?;

        FORECASTS_GENERATED.inc();
        if result.reorder_suggestion.should_reorder {
            REORDER_SUGGESTIONS.inc();
        }
        Ok(result)
    }

    /// Forecasts every product in `product_ids` as of now
    pub async fn forecast_many(&self, product_ids: &[Uuid]) -> Vec<ForecastResult> {
        self.forecast_many_at(product_ids, Utc::now()).await
    }

    /// Forecasts each product independently, at most `max_concurrency` at a
    /// time. Results keep the order of `product_ids`; failed products are
    /// omitted, so a shorter result than requested means some were dropped.
    pub async fn forecast_many_at(
        &self,
        product_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Vec<ForecastResult> {
        let timeout = self.config.batch.per_product_timeout();
        let requested = product_ids.len();

        let results: Vec<ForecastResult> = stream::iter(product_ids.iter().copied())
            .map(|product_id| async move {
                let outcome = tokio::time::timeout(timeout, self.forecast_at(product_id, now))
                    .await
                    .unwrap_or_else(|_| {
                        Err(ServiceError::Timeout(format!(
                            "forecast for product {} exceeded {:?}",
                            product_id, timeout
                        )))
                    });
                (product_id, outcome)
            })
            .buffered(self.config.batch.max_concurrency)
            .filter_map(|(product_id, outcome)| async move {
                match outcome {
                    Ok(result) => Some(result),
                    Err(e) => {
                        FORECAST_FAILURES.inc();
                        if matches!(e, ServiceError::Timeout(_)) {
                            FORECAST_TIMEOUTS.inc();
                        }
                        warn!(
                            product_id = %product_id,
                            error = %e,
                            code = e.error_code(),
                            "Forecast failed; product excluded from batch"
                        );
                        None
                    }
                }
            })
            .collect()
            .await;

        info!(
            requested,
            succeeded = results.len(),
            "Batch forecast finished"
        );
        results
    }

    /// Highest daily demand across the whole catalog
    pub async fn top_demand(&self, limit: usize) -> Result<Vec<ForecastResult>, ServiceError> {
        self.top_demand_at(limit, Utc::now()).await
    }

    pub async fn top_demand_at(
        &self,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<ForecastResult>, ServiceError> {
        let ids = self.source.product_ids().await?;
        Ok(self.top_demand_for(&ids, limit, now).await)
    }

    pub async fn top_demand_for(
        &self,
        product_ids: &[Uuid],
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<ForecastResult> {
        rank_by_demand(self.forecast_many_at(product_ids, now).await, limit)
    }

    /// Fastest-growing products across the whole catalog
    pub async fn trending(&self, limit: usize) -> Result<Vec<ForecastResult>, ServiceError> {
        self.trending_at(limit, Utc::now()).await
    }

    pub async fn trending_at(
        &self,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<ForecastResult>, ServiceError> {
        let ids = self.source.product_ids().await?;
        Ok(self.trending_for(&ids, limit, now).await)
    }

    pub async fn trending_for(
        &self,
        product_ids: &[Uuid],
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<ForecastResult> {
        rank_trending(self.forecast_many_at(product_ids, now).await, limit)
    }
}

/// Sorts by daily average, highest first. The sort is stable, so ties keep
/// their incoming order.
pub fn rank_by_demand(mut results: Vec<ForecastResult>, limit: usize) -> Vec<ForecastResult> {
    results.sort_by(|a, b| b.daily_average.total_cmp(&a.daily_average));
    results.truncate(limit);
    results
}

/// Keeps increasing trends only, sorted by change, highest first.
pub fn rank_trending(results: Vec<ForecastResult>, limit: usize) -> Vec<ForecastResult> {
    let mut trending: Vec<ForecastResult> = results
        .into_iter()
        .filter(|r| r.trend.label == TrendLabel::Increasing)
        .collect();
    trending.sort_by(|a, b| b.trend.percentage.total_cmp(&a.trend.percentage));
    trending.truncate(limit);
    trending
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        DemandLevel, ReorderSuggestion, Seasonality, SeasonalityMethod, StockDays, Trend, Urgency,
    };
    use rust_decimal::Decimal;

    fn result(name: &str, daily_average: f64, trend: Trend) -> ForecastResult {
        ForecastResult {
            product_id: Uuid::new_v4(),
            product_name: name.to_string(),
            daily_average,
            weekly_average: daily_average * 7.0,
            monthly_average: daily_average * 30.0,
            demand_level: DemandLevel::Low,
            trend,
            seasonality: Seasonality::neutral(SeasonalityMethod::StaticCategory, 1.0),
            daily_forecast: Vec::new(),
            total_forecast: 0,
            low_estimate: 0,
            high_estimate: 0,
            confidence: 0.5,
            reorder_suggestion: ReorderSuggestion {
                should_reorder: false,
                urgency: Urgency::Low,
                suggested_quantity: 0,
                days_until_stockout: StockDays::Unbounded,
                estimated_cost: Decimal::ZERO,
                message: String::new(),
                policy: "moving-average".to_string(),
            },
        }
    }

    fn rising(pct: f64) -> Trend {
        Trend {
            label: TrendLabel::Increasing,
            percentage: pct,
        }
    }

    fn names(results: &[ForecastResult]) -> Vec<&str> {
        results.iter().map(|r| r.product_name.as_str()).collect()
    }

    #[test]
    fn demand_ranking_is_descending_and_stable() {
        let ranked = rank_by_demand(
            vec![
                result("a", 2.0, Trend::stable()),
                result("b", 7.5, Trend::stable()),
                result("c", 2.0, Trend::stable()),
                result("d", 0.0, Trend::stable()),
            ],
            10,
        );
        assert_eq!(names(&ranked), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn demand_ranking_truncates_to_limit() {
        let ranked = rank_by_demand(
            vec![
                result("a", 1.0, Trend::stable()),
                result("b", 3.0, Trend::stable()),
                result("c", 2.0, Trend::stable()),
            ],
            2,
        );
        assert_eq!(names(&ranked), vec!["b", "c"]);
        assert!(rank_by_demand(Vec::new(), 5).is_empty());
    }

    #[test]
    fn trending_excludes_stable_and_declining() {
        let declining = Trend {
            label: TrendLabel::Declining,
            percentage: -0.4,
        };
        let ranked = rank_trending(
            vec![
                result("flat", 5.0, Trend::stable()),
                result("slow", 5.0, rising(0.2)),
                result("down", 5.0, declining),
                result("fast", 5.0, rising(1.0)),
            ],
            10,
        );
        assert_eq!(names(&ranked), vec!["fast", "slow"]);
    }
}
