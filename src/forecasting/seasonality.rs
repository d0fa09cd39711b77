/*!
 * # Seasonality Detection
 *
 * Month-of-year demand patterns, detected in two tiers:
 *
 * 1. **Dynamic**: sale history is folded onto calendar months (years are
 *    superimposed) and each month's mean quantity per sale is compared with
 *    the mean across months. Needs enough records spread over enough months.
 * 2. **Static**: a configured category table of known seasonal products,
 *    used when the dynamic tier has too little data or is not confident.
 */

use chrono::Datelike;
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::SeasonalityConfig;
use crate::models::{SaleRecord, Seasonality, SeasonalityMethod};

/// Per-month statistics over a sale history.
#[derive(Clone, Debug, PartialEq)]
pub struct MonthlyProfile {
    /// Month number (1-12) to mean quantity per sale event
    pub month_means: BTreeMap<u32, f64>,
    /// Mean of the monthly means
    pub overall_mean: f64,
    /// Population standard deviation of the monthly means over their mean
    pub coefficient_of_variation: f64,
}

impl MonthlyProfile {
    /// Builds the profile. Returns `None` for an empty history or one where
    /// nothing was ever sold, since deviations are undefined in both cases.
    pub fn from_records(records: &[SaleRecord]) -> Option<Self> {
        let mut buckets: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
        for r in records {
            let entry = buckets.entry(r.timestamp.month()).or_insert((0.0, 0));
            entry.0 += r.quantity_f64();
            entry.1 += 1;
        }
        if buckets.is_empty() {
            return None;
        }

        let month_means: BTreeMap<u32, f64> = buckets
            .into_iter()
            .map(|(month, (sum, count))| (month, sum / count as f64))
            .collect();

        let n = month_means.len() as f64;
        let overall_mean = month_means.values().sum::<f64>() / n;
        if overall_mean <= 0.0 {
            return None;
        }

        let variance = month_means
            .values()
            .map(|m| (m - overall_mean).powi(2))
            .sum::<f64>()
            / n;

        Some(Self {
            month_means,
            overall_mean,
            coefficient_of_variation: variance.sqrt() / overall_mean,
        })
    }

    pub fn months_with_data(&self) -> usize {
        self.month_means.len()
    }

    /// Relative deviation of a month from the overall mean
    pub fn deviation(&self, month: u32) -> Option<f64> {
        self.month_means
            .get(&month)
            .map(|m| (m - self.overall_mean) / self.overall_mean)
    }

    fn months_where(&self, pred: impl Fn(f64) -> bool) -> Vec<u32> {
        self.month_means
            .keys()
            .copied()
            .filter(|m| self.deviation(*m).map(&pred).unwrap_or(false))
            .collect()
    }
}

/// Result of the dynamic tier before the fallback decision
#[derive(Clone, Debug, PartialEq)]
enum DynamicOutcome {
    /// Too few records or months to judge
    Insufficient,
    /// Enough data and no seasonal pattern
    NoPattern,
    Seasonal(Seasonality),
}

pub struct SeasonalityDetector<'a> {
    config: &'a SeasonalityConfig,
}

impl<'a> SeasonalityDetector<'a> {
    pub fn new(config: &'a SeasonalityConfig) -> Self {
        Self { config }
    }

    /// Detects the seasonal factor for `current_month` (1-12).
    ///
    /// A dynamic result without a pattern is final; the category table is
    /// only consulted when the history cannot support a verdict or the
    /// detected pattern is below the confidence cutoff.
    pub fn detect(
        &self,
        records: &[SaleRecord],
        category: &str,
        current_month: u32,
    ) -> Seasonality {
        match self.detect_dynamic(records, current_month) {
            DynamicOutcome::Seasonal(s) if s.confidence >= self.config.confidence_cutoff => s,
            DynamicOutcome::Seasonal(s) => {
                debug!(
                    category,
                    confidence = s.confidence,
                    "dynamic seasonality below cutoff, using category table"
                );
                self.static_fallback(category, current_month)
            }
            DynamicOutcome::NoPattern => {
                Seasonality::neutral(SeasonalityMethod::DynamicNoPattern, 1.0)
            }
            DynamicOutcome::Insufficient => self.static_fallback(category, current_month),
        }
    }

    fn detect_dynamic(&self, records: &[SaleRecord], current_month: u32) -> DynamicOutcome {
        let cfg = self.config;
        if records.len() < cfg.min_records {
            return DynamicOutcome::Insufficient;
        }
        let profile = match MonthlyProfile::from_records(records) {
            Some(p) => p,
            None => return DynamicOutcome::NoPattern,
        };
        if profile.months_with_data() < cfg.min_months {
            return DynamicOutcome::Insufficient;
        }

        let peak_months = profile.months_where(|d| d > cfg.peak_threshold);
        let low_months = profile.months_where(|d| d < -cfg.low_threshold);
        let cv = profile.coefficient_of_variation;

        if peak_months.len() < cfg.min_peak_months || cv <= cfg.cv_threshold {
            return DynamicOutcome::NoPattern;
        }

        let confidence = 0.4 * (profile.months_with_data() as f64 / 12.0).min(1.0)
            + 0.3 * (cv / 0.5).min(1.0)
            + 0.3 * (peak_months.len() as f64 / 4.0).min(1.0);

        let factor = match profile.deviation(current_month) {
            Some(dev) if peak_months.contains(&current_month) => {
                (1.0 + dev).clamp(1.0, cfg.peak_factor_max)
            }
            Some(dev) if dev < -cfg.low_factor_threshold => {
                (1.0 + dev).clamp(cfg.low_factor_min, 1.0)
            }
            _ => 1.0,
        };

        DynamicOutcome::Seasonal(Seasonality {
            is_seasonal: true,
            factor,
            peak_months,
            low_months,
            confidence: confidence.min(1.0),
            method: SeasonalityMethod::Dynamic,
        })
    }

    /// Category table lookup. Unknown or non-seasonal categories are neutral
    /// with full confidence.
    pub fn static_fallback(&self, category: &str, current_month: u32) -> Seasonality {
        let cfg = self.config;
        match cfg.category(category) {
            Some(entry) if entry.seasonal => {
                let raw = if entry.peak_months.contains(&current_month) {
                    cfg.static_peak_factor
                } else {
                    cfg.static_off_peak_factor
                };
                let mut peak_months = entry.peak_months.clone();
                peak_months.sort_unstable();
                Seasonality {
                    is_seasonal: true,
                    factor: raw.clamp(cfg.low_factor_min, cfg.peak_factor_max),
                    peak_months,
                    low_months: Vec::new(),
                    confidence: cfg.static_confidence,
                    method: SeasonalityMethod::StaticCategory,
                }
            }
            _ => Seasonality::neutral(SeasonalityMethod::StaticCategory, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    /// Five sales per month for `months` months ending June 2024, with the
    /// per-sale quantity picked by calendar month.
    fn monthly_series(months: u32, quantity_for: impl Fn(u32) -> u32) -> Vec<SaleRecord> {
        let mut records = Vec::new();
        let (mut year, mut month) = (2024, 6);
        for _ in 0..months {
            for day in [3, 9, 15, 21, 27] {
                let ts = Utc.with_ymd_and_hms(year, month, day, 10, 0, 0).unwrap();
                records.push(SaleRecord::new(ts, quantity_for(month), Decimal::ONE));
            }
            if month == 1 {
                month = 12;
                year -= 1;
            } else {
                month -= 1;
            }
        }
        records.sort_by_key(|r| r.timestamp);
        records
    }

    fn winter_peak(month: u32) -> u32 {
        if month == 12 || month == 1 {
            20
        } else {
            10
        }
    }

    #[test]
    fn detects_december_january_peak() {
        let cfg = SeasonalityConfig::default();
        let records = monthly_series(24, winter_peak);
        assert!(records.len() >= 100);

        let s = SeasonalityDetector::new(&cfg).detect(&records, "analgesics", 6);
        assert!(s.is_seasonal);
        assert_eq!(s.method, SeasonalityMethod::Dynamic);
        assert!(s.peak_months.contains(&12));
        assert!(s.peak_months.contains(&1));
        assert!(s.confidence >= 0.6, "confidence {}", s.confidence);
        // June sits slightly under the mean but not far enough to damp
        assert_eq!(s.factor, 1.0);
    }

    #[test]
    fn peak_month_raises_factor_within_cap() {
        let cfg = SeasonalityConfig::default();
        let records = monthly_series(24, winter_peak);
        let s = SeasonalityDetector::new(&cfg).detect(&records, "analgesics", 12);
        // mean of monthly means is 14/12 of baseline, so December sits ~71% above
        assert!((s.factor - 12.0 / 7.0).abs() < 1e-9);
        assert!(s.factor <= 1.8);
    }

    #[test]
    fn low_month_damps_factor() {
        let cfg = SeasonalityConfig::default();
        let records = monthly_series(24, |m| match m {
            12 | 1 => 20,
            7 => 4,
            _ => 10,
        });
        let s = SeasonalityDetector::new(&cfg).detect(&records, "analgesics", 7);
        assert!(s.is_seasonal);
        assert!(s.low_months.contains(&7));
        assert_eq!(s.factor, 0.6);
    }

    #[test]
    fn flat_history_has_no_pattern() {
        let cfg = SeasonalityConfig::default();
        let records = monthly_series(24, |_| 10);
        // the category table says seasonal, but the data outranks it
        let s = SeasonalityDetector::new(&cfg).detect(&records, "respiratory", 12);
        assert!(!s.is_seasonal);
        assert_eq!(s.factor, 1.0);
        assert_eq!(s.method, SeasonalityMethod::DynamicNoPattern);
    }

    #[test]
    fn sparse_history_uses_category_table() {
        let cfg = SeasonalityConfig::default();
        let records = monthly_series(3, |_| 10);

        let peak = SeasonalityDetector::new(&cfg).detect(&records, "Respiratory", 1);
        assert_eq!(peak.method, SeasonalityMethod::StaticCategory);
        assert!(peak.is_seasonal);
        assert_eq!(peak.factor, 1.3);
        assert_eq!(peak.confidence, 0.7);

        let off_peak = SeasonalityDetector::new(&cfg).detect(&records, "Respiratory", 7);
        assert_eq!(off_peak.factor, 0.9);
        assert_eq!(off_peak.confidence, 0.7);
    }

    #[test]
    fn unknown_category_is_neutral() {
        let cfg = SeasonalityConfig::default();
        let s = SeasonalityDetector::new(&cfg).detect(&[], "Dermatology", 3);
        assert!(!s.is_seasonal);
        assert_eq!(s.factor, 1.0);
        assert_eq!(s.confidence, 1.0);
        assert_eq!(s.method, SeasonalityMethod::StaticCategory);
    }

    #[test]
    fn weak_dynamic_pattern_defers_to_table() {
        // six months of data, two of them doubled: seasonal, confidence ~0.56
        let cfg = SeasonalityConfig {
            min_records: 30,
            ..SeasonalityConfig::default()
        };
        let records = monthly_series(6, |m| if m == 6 || m == 5 { 20 } else { 10 });
        let s = SeasonalityDetector::new(&cfg).detect(&records, "allergy", 5);
        assert_eq!(s.method, SeasonalityMethod::StaticCategory);
        assert_eq!(s.factor, 1.3);
    }

    #[test]
    fn all_zero_quantities_have_no_pattern() {
        let cfg = SeasonalityConfig::default();
        let records = monthly_series(24, |_| 0);
        let s = SeasonalityDetector::new(&cfg).detect(&records, "allergy", 4);
        assert_eq!(s.method, SeasonalityMethod::DynamicNoPattern);
        assert_eq!(s.factor, 1.0);
    }

    #[test]
    fn profile_statistics() {
        let records = monthly_series(12, winter_peak);
        let profile = MonthlyProfile::from_records(&records).unwrap();
        assert_eq!(profile.months_with_data(), 12);
        assert!((profile.overall_mean - 140.0 / 12.0).abs() < 1e-9);
        assert!(profile.coefficient_of_variation > 0.25);
        assert!(MonthlyProfile::from_records(&[]).is_none());
    }
}
