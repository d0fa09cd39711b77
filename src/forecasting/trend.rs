//! Week-over-week momentum.

use chrono::{DateTime, Duration, Utc};

use crate::config::TrendConfig;
use crate::models::{SaleRecord, Trend, TrendLabel};

/// Compares the most recent window with the one immediately before it.
///
/// Needs at least two full windows of history (14 days by default); shorter
/// histories are reported as stable.
pub fn detect_trend(records: &[SaleRecord], now: DateTime<Utc>, config: &TrendConfig) -> Trend {
    let window = Duration::days(i64::from(config.window_days));

    let earliest = match records.iter().map(|r| r.timestamp).min() {
        Some(ts) => ts,
        None => return Trend::stable(),
    };
    if now - earliest < window * 2 {
        return Trend::stable();
    }

    let recent_start = now - window;
    let previous_start = now - window * 2;

    let mut recent_total = 0.0;
    let mut previous_total = 0.0;
    for r in records {
        if r.timestamp > recent_start && r.timestamp <= now {
            recent_total += r.quantity_f64();
        } else if r.timestamp > previous_start && r.timestamp <= recent_start {
            previous_total += r.quantity_f64();
        }
    }

    classify_trend(recent_total, previous_total, config.threshold)
}

/// Labels the relative change between two window totals.
pub fn classify_trend(recent_total: f64, previous_total: f64, threshold: f64) -> Trend {
    if previous_total == 0.0 {
        return if recent_total > 0.0 {
            Trend {
                label: TrendLabel::Increasing,
                percentage: 1.0,
            }
        } else {
            Trend::stable()
        };
    }

    let change = (recent_total - previous_total) / previous_total;
    let label = if change >= threshold {
        TrendLabel::Increasing
    } else if change <= -threshold {
        TrendLabel::Declining
    } else {
        TrendLabel::Stable
    };

    Trend {
        label,
        percentage: change,
    }
}

/// Multiplier applied to the base rate: `1 + change`, with the change capped
/// to `±max_adjustment` so a single spike cannot double the forecast.
pub fn trend_factor(trend: &Trend, max_adjustment: f64) -> f64 {
    1.0 + trend.percentage.clamp(-max_adjustment, max_adjustment)
}
