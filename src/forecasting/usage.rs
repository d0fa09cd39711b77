//! Windowed consumption rates.

use chrono::{DateTime, Duration, Utc};

use crate::config::DemandThresholds;
use crate::models::{DemandLevel, SaleRecord};

/// Total quantity sold in `[now - window_days, now]`.
pub fn window_total(records: &[SaleRecord], window_days: u32, now: DateTime<Utc>) -> f64 {
    let since = now - Duration::days(i64::from(window_days));
    records
        .iter()
        .filter(|r| r.timestamp >= since && r.timestamp <= now)
        .map(SaleRecord::quantity_f64)
        .fold(0.0, |acc, q| acc + q)
}

/// Average units consumed per day over the trailing window.
///
/// The total is divided by the full window length rather than by the number
/// of days that had sales, so intermittent sellers are not overstated.
pub fn average_daily_usage(records: &[SaleRecord], window_days: u32, now: DateTime<Utc>) -> f64 {
    if window_days == 0 {
        return 0.0;
    }
    window_total(records, window_days, now) / f64::from(window_days)
}

/// Daily, weekly and monthly consumption figures for one product.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UsageAverages {
    pub daily: f64,
    pub weekly: f64,
    pub monthly: f64,
}

impl UsageAverages {
    /// `daily` uses the configured usage window; weekly and monthly are the
    /// quantities moved over the trailing 7 and 30 days.
    pub fn compute(records: &[SaleRecord], usage_window_days: u32, now: DateTime<Utc>) -> Self {
        Self {
            daily: average_daily_usage(records, usage_window_days, now),
            weekly: window_total(records, 7, now),
            monthly: window_total(records, 30, now),
        }
    }
}

/// Buckets a daily average: High at or above the high threshold, Medium at
/// or above the medium threshold, Low for any positive rate, otherwise None.
pub fn classify_demand(daily_average: f64, thresholds: &DemandThresholds) -> DemandLevel {
    if daily_average >= thresholds.high_threshold {
        DemandLevel::High
    } else if daily_average >= thresholds.medium_threshold {
        DemandLevel::Medium
    } else if daily_average > 0.0 {
        DemandLevel::Low
    } else {
        DemandLevel::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn sale(days_ago: i64, quantity: u32) -> SaleRecord {
        SaleRecord::new(now() - Duration::days(days_ago), quantity, dec!(4.50))
    }

    #[test]
    fn empty_history_averages_to_zero() {
        assert_eq!(average_daily_usage(&[], 30, now()), 0.0);
        let avgs = UsageAverages::compute(&[], 30, now());
        assert_eq!(avgs, UsageAverages { daily: 0.0, weekly: 0.0, monthly: 0.0 });
        // must not serialize as -0.0
        assert!(window_total(&[], 7, now()).is_sign_positive());
        assert!(avgs.weekly.is_sign_positive());
    }

    #[test]
    fn divides_by_full_window_not_active_days() {
        // two sales of 15 in a 30 day window: 1 unit/day, not 15
        let records = vec![sale(3, 15), sale(20, 15)];
        assert_eq!(average_daily_usage(&records, 30, now()), 1.0);
    }

    #[test]
    fn ignores_records_outside_window() {
        let records = vec![sale(45, 100), sale(2, 14), sale(-1, 50)];
        assert_eq!(average_daily_usage(&records, 7, now()), 2.0);
        assert_eq!(window_total(&records, 30, now()), 14.0);
    }

    #[test]
    fn weekly_and_monthly_are_window_totals() {
        let records: Vec<_> = (0..30).map(|d| sale(d, 5)).collect();
        let avgs = UsageAverages::compute(&records, 30, now());
        assert_eq!(avgs.daily, 5.0);
        assert_eq!(avgs.weekly, 40.0); // days 0..=7 inclusive of the boundary
        assert_eq!(avgs.monthly, 150.0);
    }

    #[rstest]
    #[case(0.0, DemandLevel::None)]
    #[case(0.01, DemandLevel::Low)]
    #[case(2.99, DemandLevel::Low)]
    #[case(3.0, DemandLevel::Medium)]
    #[case(9.99, DemandLevel::Medium)]
    #[case(10.0, DemandLevel::High)]
    #[case(250.0, DemandLevel::High)]
    fn classifies_against_thresholds(#[case] daily: f64, #[case] expected: DemandLevel) {
        assert_eq!(classify_demand(daily, &DemandThresholds::default()), expected);
    }
}
