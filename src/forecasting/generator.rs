//! Multi-day demand projection.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::config::{ForecastSettings, IntervalMethod};
use crate::forecasting::trend::trend_factor;
use crate::models::{ForecastPoint, Seasonality, Trend};

/// Projection for one product over the forecast horizon
#[derive(Clone, Debug, PartialEq)]
pub struct ForecastOutput {
    /// Base rate after trend and seasonal adjustment
    pub adjusted_rate: f64,
    pub daily: Vec<ForecastPoint>,
    pub total: u64,
    pub low: u64,
    pub high: u64,
}

impl ForecastOutput {
    /// All-zero projection, used when there is no history to project from
    pub fn zero(horizon_days: u32, start: NaiveDate) -> Self {
        Self {
            adjusted_rate: 0.0,
            daily: forecast_dates(start, horizon_days)
                .map(|date| ForecastPoint {
                    date,
                    predicted_demand: 0.0,
                })
                .collect(),
            total: 0,
            low: 0,
            high: 0,
        }
    }
}

fn forecast_dates(start: NaiveDate, horizon_days: u32) -> impl Iterator<Item = NaiveDate> {
    (1..=i64::from(horizon_days)).map(move |d| start + Duration::days(d))
}

/// Random source for the daily jitter. A configured seed is mixed with the
/// product id so every product gets its own reproducible sequence.
pub fn jitter_rng(product_id: Uuid, seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => {
            let id = product_id.as_u128();
            StdRng::seed_from_u64(seed ^ (id as u64) ^ ((id >> 64) as u64))
        }
        None => StdRng::from_entropy(),
    }
}

pub struct ForecastGenerator<'a> {
    settings: &'a ForecastSettings,
    max_trend_adjustment: f64,
}

impl<'a> ForecastGenerator<'a> {
    pub fn new(settings: &'a ForecastSettings, max_trend_adjustment: f64) -> Self {
        Self {
            settings,
            max_trend_adjustment,
        }
    }

    /// Projects `base_rate` forward from the day after `start`.
    ///
    /// Each day is the adjusted rate times a multiplier drawn from
    /// `[1 - jitter, 1 + jitter]`; `daily_std_dev` only matters for the
    /// variance interval method.
    pub fn generate<R: Rng>(
        &self,
        base_rate: f64,
        trend: &Trend,
        seasonality: &Seasonality,
        daily_std_dev: f64,
        start: NaiveDate,
        rng: &mut R,
    ) -> ForecastOutput {
        let adjusted_rate = (base_rate
            * trend_factor(trend, self.max_trend_adjustment)
            * seasonality.factor)
            .max(0.0);
        let jitter = self.settings.jitter;

        let mut sum = 0.0;
        let daily: Vec<ForecastPoint> = forecast_dates(start, self.settings.horizon_days)
            .map(|date| {
                let multiplier = if jitter > 0.0 {
                    rng.gen_range((1.0 - jitter)..=(1.0 + jitter))
                } else {
                    1.0
                };
                let value = (adjusted_rate * multiplier).max(0.0);
                sum += value;
                ForecastPoint {
                    date,
                    predicted_demand: round2(value),
                }
            })
            .collect();

        let total = sum.round() as u64;
        let (low, high) = self.interval(total, daily_std_dev);

        ForecastOutput {
            adjusted_rate,
            daily,
            total,
            low,
            high,
        }
    }

    fn interval(&self, total: u64, daily_std_dev: f64) -> (u64, u64) {
        let t = total as f64;
        match self.settings.interval {
            IntervalMethod::Fixed => {
                let p = self.settings.interval_percent;
                (
                    (t * (1.0 - p)).round() as u64,
                    (t * (1.0 + p)).round() as u64,
                )
            }
            IntervalMethod::Variance => {
                let spread = self.settings.interval_z
                    * daily_std_dev
                    * f64::from(self.settings.horizon_days).sqrt();
                ((t - spread).max(0.0).round() as u64, (t + spread).round() as u64)
            }
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
