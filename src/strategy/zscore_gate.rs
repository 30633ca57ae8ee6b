//! Z-Score Gate
//!
//! Rolling z-score of a series against its own trailing window:
//!
//! z = (value - rolling_mean) / rolling_std
//!
//! Used on the price ratio of a pair; the long/short triggers compare the
//! z-score against asymmetric bands straddling zero.

use super::stats;

/// Rolling std at or below `STD_EPSILON * max(|mean|, 1)` counts as flat.
pub const STD_EPSILON: f64 = 1e-12;

/// Z-score and the statistics it was computed from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZScoreResult {
    pub z_score: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub value: f64,
}

impl ZScoreResult {
    /// Below the (negative) low band
    pub fn is_below(&self, low_band: f64) -> bool {
        self.z_score < low_band
    }

    /// Above the (positive) high band
    pub fn is_above(&self, high_band: f64) -> bool {
        self.z_score > high_band
    }

    /// Defined only after warm-up and with non-zero dispersion
    pub fn is_defined(&self) -> bool {
        self.z_score.is_finite()
    }
}

/// Trailing-window z-score calculator
#[derive(Debug, Clone, Copy)]
pub struct ZScoreGate {
    lookback: usize,
}

impl ZScoreGate {
    pub fn new(lookback: usize) -> Self {
        Self { lookback }
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// Z-score for every position of `values`
    ///
    /// Positions before the window fills, windows containing a missing value
    /// and flat windows (see `STD_EPSILON`) give a NaN z-score.
    pub fn compute(&self, values: &[f64]) -> Vec<ZScoreResult> {
        let (means, stds) = stats::rolling_mean_std(values, self.lookback);

        values
            .iter()
            .zip(means.iter().zip(stds.iter()))
            .map(|(&value, (&mean, &std_dev))| {
                let z_score = if std_dev > STD_EPSILON * mean.abs().max(1.0) {
                    (value - mean) / std_dev
                } else {
                    f64::NAN
                };
                ZScoreResult {
                    z_score,
                    mean,
                    std_dev,
                    value,
                }
            })
            .collect()
    }
}
