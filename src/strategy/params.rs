//! Backtest Parameters
//!
//! Threshold rule configuration for the pair backtest. Defaults mirror a
//! quarter-year lookback with symmetric one-sigma bands and a two-day hold.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{AnalyticsError, AnalyticsResult};

/// Z-score threshold rule parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestParams {
    /// Rolling window (rows) for the ratio mean/std, also the warm-up length
    pub lookback: usize,
    /// Go long the ratio when z-score falls below this (expected negative)
    pub low_quantile: f64,
    /// Go short the ratio when z-score rises above this (expected positive)
    pub high_quantile: f64,
    /// Business days a triggered signal stays on, trigger day included
    pub hold_days: usize,
}

impl Default for BacktestParams {
    fn default() -> Self {
        Self {
            lookback: 63,
            low_quantile: -1.0,
            high_quantile: 1.0,
            hold_days: 2,
        }
    }
}

impl BacktestParams {
    pub fn with_lookback(mut self, lookback: usize) -> Self {
        self.lookback = lookback;
        self
    }

    pub fn with_bands(mut self, low_quantile: f64, high_quantile: f64) -> Self {
        self.low_quantile = low_quantile;
        self.high_quantile = high_quantile;
        self
    }

    pub fn with_hold_days(mut self, hold_days: usize) -> Self {
        self.hold_days = hold_days;
        self
    }

    /// Reject unusable parameters; warn on bands that do not straddle zero
    pub fn validate(&self) -> AnalyticsResult<()> {
        if self.lookback == 0 {
            return Err(AnalyticsError::invalid("lookback must be > 0"));
        }
        if self.hold_days == 0 {
            return Err(AnalyticsError::invalid("hold_days must be > 0"));
        }
        if !self.low_quantile.is_finite() || !self.high_quantile.is_finite() {
            return Err(AnalyticsError::InvalidArgument(format!(
                "quantile bands must be finite, got low={} high={}",
                self.low_quantile, self.high_quantile
            )));
        }

        if self.low_quantile >= 0.0 || self.high_quantile <= 0.0 {
            warn!(
                low = self.low_quantile,
                high = self.high_quantile,
                "Z-score bands do not straddle zero; signals may fire every day"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = BacktestParams::default();
        assert_eq!(params.lookback, 63);
        assert_eq!(params.low_quantile, -1.0);
        assert_eq!(params.high_quantile, 1.0);
        assert_eq!(params.hold_days, 2);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_params_builder() {
        let params = BacktestParams::default()
            .with_lookback(20)
            .with_bands(-2.0, 1.5)
            .with_hold_days(5);
        assert_eq!(params.lookback, 20);
        assert_eq!(params.low_quantile, -2.0);
        assert_eq!(params.high_quantile, 1.5);
        assert_eq!(params.hold_days, 5);
    }

    #[test]
    fn test_zero_lookback_rejected() {
        let params = BacktestParams::default().with_lookback(0);
        assert!(matches!(params.validate(), Err(AnalyticsError::InvalidArgument(_))));
    }

    #[test]
    fn test_zero_hold_days_rejected() {
        let params = BacktestParams::default().with_hold_days(0);
        assert!(matches!(params.validate(), Err(AnalyticsError::InvalidArgument(_))));
    }

    #[test]
    fn test_non_finite_bands_rejected() {
        let params = BacktestParams::default().with_bands(f64::NAN, 1.0);
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_same_side_bands_only_warn() {
        let params = BacktestParams::default().with_bands(0.5, 1.0);
        assert!(params.validate().is_ok());
    }
}
