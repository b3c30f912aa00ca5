//! Posterior-predictive summaries.
//!
//! Each simulated outcome is drawn in two stages: a parameter from the arm's
//! posterior, then one outcome conditioned on that parameter. The helpers here
//! reduce a batch of such outcomes to the per-arm report.

use serde::{Deserialize, Serialize};

/// Decimal places used for every reported PPD statistic.
pub const PPD_DECIMALS: u32 = 3;

/// Lower and upper percentiles of the reported credible interval.
pub const INTERVAL_PERCENTILES: (f64, f64) = (2.5, 97.5);

/// Round half away from zero to `places` decimals.
#[must_use]
pub fn round_to(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(places.min(15) as i32);
    (value * factor).round() / factor
}

#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Percentile with linear interpolation between closest ranks.
///
/// `q` is in percent (`0.0..=100.0`). `sorted` must be ascending.
#[must_use]
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = (q.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let weight = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}

/// Model-specific predictive statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PpdStats {
    /// Fractions of simulated successes and failures.
    Binary { success: f64, failure: f64 },
    /// Mean outcome with a 95% percentile interval.
    Interval { mean: f64, lower: f64, upper: f64 },
}

impl PpdStats {
    /// Names of the statistics carried by this variant.
    #[must_use]
    pub const fn keys(&self) -> &'static [&'static str] {
        match self {
            Self::Binary { .. } => &["success", "failure"],
            Self::Interval { .. } => &["mean", "lower", "upper"],
        }
    }

    /// Summarise 0/1 outcomes as success and failure fractions.
    #[must_use]
    pub fn binary(outcomes: &[f64]) -> Self {
        let total = outcomes.len().max(1) as f64;
        let successes = outcomes.iter().filter(|&&value| value >= 0.5).count() as f64;
        let success = successes / total;
        Self::Binary {
            success: round_to(success, PPD_DECIMALS),
            failure: round_to(1.0 - success, PPD_DECIMALS),
        }
    }

    /// Summarise real-valued outcomes as mean plus [2.5, 97.5] percentiles.
    #[must_use]
    pub fn interval(outcomes: &[f64]) -> Self {
        let mut sorted = outcomes.to_vec();
        sorted.sort_by(f64::total_cmp);
        let (lo, hi) = INTERVAL_PERCENTILES;
        Self::Interval {
            mean: round_to(mean(&sorted), PPD_DECIMALS),
            lower: round_to(percentile(&sorted, lo), PPD_DECIMALS),
            upper: round_to(percentile(&sorted, hi), PPD_DECIMALS),
        }
    }
}

/// Predictive report for one arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PpdSummary {
    pub label: String,
    pub draws: usize,
    #[serde(flatten)]
    pub stats: PpdStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_to_places() {
        assert_eq!(round_to(0.999_000_999, 3), 0.999);
        assert_eq!(round_to(100.001_000_1, 4), 100.001);
        assert_eq!(round_to(2.5, 0), 3.0);
        assert!(round_to(f64::INFINITY, 3).is_infinite());
    }

    #[test]
    fn percentile_interpolates_like_closest_ranks() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 50.0), 3.0);
        assert_eq!(percentile(&sorted, 100.0), 5.0);
        assert!((percentile(&sorted, 2.5) - 1.1).abs() < 1e-12);
        assert!((percentile(&sorted, 97.5) - 4.9).abs() < 1e-12);
    }

    #[test]
    fn percentile_of_single_value() {
        assert_eq!(percentile(&[42.0], 97.5), 42.0);
        assert!(percentile(&[], 50.0).is_nan());
    }

    #[test]
    fn binary_fractions_sum_to_one() {
        let stats = PpdStats::binary(&[1.0, 0.0, 1.0, 1.0]);
        assert_eq!(
            stats,
            PpdStats::Binary {
                success: 0.75,
                failure: 0.25
            }
        );
    }

    #[test]
    fn interval_orders_unsorted_input() {
        let stats = PpdStats::interval(&[5.0, 1.0, 3.0, 2.0, 4.0]);
        match stats {
            PpdStats::Interval { mean, lower, upper } => {
                assert_eq!(mean, 3.0);
                assert_eq!(lower, 1.1);
                assert_eq!(upper, 4.9);
            }
            PpdStats::Binary { .. } => panic!("expected interval stats"),
        }
    }

    #[test]
    fn summary_serializes_flat() {
        let summary = PpdSummary {
            label: "option1".to_string(),
            draws: 4,
            stats: PpdStats::binary(&[1.0, 0.0, 0.0, 0.0]),
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["label"], "option1");
        assert_eq!(value["kind"], "binary");
        assert_eq!(value["success"], 0.25);
    }
}
