//! Reliability score for a forecast.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;

use crate::models::SaleRecord;

/// History span (in days) that earns the full data-volume score
const FULL_HISTORY_DAYS: f64 = 90.0;
const RECENT_DAYS: i64 = 30;

/// Quantity sold per calendar day, for days with at least one sale.
pub fn daily_totals(records: &[SaleRecord]) -> BTreeMap<NaiveDate, f64> {
    let mut totals = BTreeMap::new();
    for r in records {
        *totals.entry(r.day()).or_insert(0.0) += r.quantity_f64();
    }
    totals
}

/// Population variance of the daily totals; zero for fewer than two days.
pub fn daily_variance(records: &[SaleRecord]) -> f64 {
    let totals = daily_totals(records);
    if totals.len() < 2 {
        return 0.0;
    }
    let n = totals.len() as f64;
    let mean = totals.values().sum::<f64>() / n;
    totals.values().map(|t| (t - mean).powi(2)).sum::<f64>() / n
}

pub fn daily_std_dev(records: &[SaleRecord]) -> f64 {
    daily_variance(records).sqrt()
}

/// Scores how much a forecast built from `records` can be trusted, in [0, 1].
///
/// Three parts: history length (up to 0.4 at 90 days), any sale within the
/// last 30 days (0.3), and consistency of daily totals (up to 0.3, reduced by
/// variance / 100). An empty history scores 0.
pub fn score_confidence(records: &[SaleRecord], now: DateTime<Utc>) -> f64 {
    let earliest = match records.iter().map(|r| r.timestamp).min() {
        Some(ts) => ts,
        None => return 0.0,
    };

    let history_days = (now - earliest).num_days().max(0) as f64;
    let data_point_score = 0.4 * (history_days / FULL_HISTORY_DAYS).min(1.0);

    let recent_cutoff = now - Duration::days(RECENT_DAYS);
    let recent_data_score = if records.iter().any(|r| r.timestamp >= recent_cutoff) {
        0.3
    } else {
        0.0
    };

    let consistency_score = (0.3 - daily_variance(records) / 100.0).max(0.0);

    (data_point_score + recent_data_score + consistency_score).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 9, 0, 0).unwrap()
    }

    fn sale(days_ago: i64, quantity: u32) -> SaleRecord {
        SaleRecord::new(now() - Duration::days(days_ago), quantity, Decimal::ONE)
    }

    #[test]
    fn empty_history_scores_zero() {
        assert_eq!(score_confidence(&[], now()), 0.0);
    }

    #[test]
    fn steady_long_history_scores_full() {
        let records: Vec<_> = (0..=90).map(|d| sale(d, 5)).collect();
        assert!((score_confidence(&records, now()) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn stale_history_loses_recency_score() {
        let records: Vec<_> = (45..=90).map(|d| sale(d, 5)).collect();
        // 0.4 for volume, 0 for recency, 0.3 for zero variance
        assert!((score_confidence(&records, now()) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn volatile_history_loses_consistency_score() {
        let records: Vec<_> = (0..=90)
            .map(|d| sale(d, if d % 2 == 0 { 0 } else { 40 }))
            .collect();
        // variance of alternating 0/40 days is ~400, wiping the consistency part
        let score = score_confidence(&records, now());
        assert!((score - 0.7).abs() < 1e-12, "score {}", score);
    }

    #[test]
    fn daily_totals_group_by_calendar_day() {
        let day = now() - Duration::days(2);
        let records = vec![
            SaleRecord::new(day, 3, Decimal::ONE),
            SaleRecord::new(day + Duration::hours(1), 4, Decimal::ONE),
            sale(1, 2),
        ];
        let totals = daily_totals(&records);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&day.date_naive()], 7.0);
        assert!((daily_variance(&records) - 6.25).abs() < 1e-12);
    }
}
