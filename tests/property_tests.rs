//! Property-based tests for the forecasting pipeline.
//!
//! These tests use proptest to check the invariants every forecast must hold,
//! whatever the shape of the sale history.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pharmacy_forecast::config::{DemandThresholds, ForecastConfig};
use pharmacy_forecast::forecasting::{classify_demand, score_confidence, ForecastEngine};
use pharmacy_forecast::models::{DemandLevel, ProductSnapshot, SaleRecord};
use proptest::prelude::*;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 20, 9, 30, 0).unwrap()
}

// Sales scattered over the last two years, up to a few hundred of them
fn history_strategy() -> impl Strategy<Value = Vec<SaleRecord>> {
    prop::collection::vec((0i64..730 * 24, 0u32..60), 0..300).prop_map(|sales| {
        sales
            .into_iter()
            .map(|(hours_ago, quantity)| {
                SaleRecord::new(now() - Duration::hours(hours_ago), quantity, dec!(3.25))
            })
            .collect()
    })
}

fn category_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("Respiratory"),
        Just("Allergy"),
        Just("Vitamins"),
        Just("Analgesics"),
        Just("Dermatology"),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn confidence_stays_in_unit_interval(history in history_strategy()) {
        let c = score_confidence(&history, now());
        prop_assert!((0.0..=1.0).contains(&c), "confidence {}", c);
    }

    #[test]
    fn forecast_invariants_hold(
        history in history_strategy(),
        category in category_strategy(),
        stock in 0u32..2_000,
        reorder_level in 0u32..200,
    ) {
        let mut cfg = ForecastConfig::default();
        cfg.forecast.seed = Some(7);
        let product = ProductSnapshot::new(Uuid::new_v4(), "Generic", category)
            .with_stock(stock, reorder_level)
            .with_cost_price(dec!(1.10));

        let result = ForecastEngine::new(&cfg).build(&product, &history, now()).unwrap();

        prop_assert!(result.daily_average >= 0.0);
        prop_assert!((0.0..=1.0).contains(&result.confidence));
        prop_assert!(result.low_estimate <= result.total_forecast);
        prop_assert!(result.total_forecast <= result.high_estimate);
        prop_assert!(result.daily_forecast.iter().all(|p| p.predicted_demand >= 0.0));
        prop_assert!(result.seasonality.factor >= 0.6 && result.seasonality.factor <= 1.8);
        prop_assert_eq!(result.daily_forecast.len(), 30);

        let reorder = &result.reorder_suggestion;
        if reorder.should_reorder {
            prop_assert!(reorder.suggested_quantity >= reorder_level.saturating_sub(stock));
        } else {
            prop_assert_eq!(reorder.suggested_quantity, 0);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn demand_level_is_monotonic(a in 0.0f64..50.0, b in 0.0f64..50.0) {
        let thresholds = DemandThresholds::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(classify_demand(lo, &thresholds) <= classify_demand(hi, &thresholds));
    }

    #[test]
    fn positive_demand_is_never_none(rate in 0.0001f64..50.0) {
        prop_assert_ne!(classify_demand(rate, &DemandThresholds::default()), DemandLevel::None);
    }
}
