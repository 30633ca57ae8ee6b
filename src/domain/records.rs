//! Result records produced by the analytics core

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::AnalyticsError;
use super::float_serde::{self, float_eq};

/// Co-movement measure used to rank pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    Pearson,
    Spearman,
    /// Directional beta, cov(x, y) / var(y)
    Ols,
    /// Pearson on Kalman-denoised returns
    Kalman,
}

impl CorrelationMethod {
    pub const ALL: [CorrelationMethod; 4] = [
        CorrelationMethod::Pearson,
        CorrelationMethod::Spearman,
        CorrelationMethod::Ols,
        CorrelationMethod::Kalman,
    ];

    /// Symmetric methods emit each unordered pair once with `ticker_a < ticker_b`
    pub fn is_symmetric(&self) -> bool {
        !matches!(self, CorrelationMethod::Ols)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "pearson",
            CorrelationMethod::Spearman => "spearman",
            CorrelationMethod::Ols => "ols",
            CorrelationMethod::Kalman => "kalman",
        }
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrelationMethod {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pearson" => Ok(CorrelationMethod::Pearson),
            "spearman" => Ok(CorrelationMethod::Spearman),
            "ols" => Ok(CorrelationMethod::Ols),
            "kalman" => Ok(CorrelationMethod::Kalman),
            other => Err(AnalyticsError::InvalidArgument(format!(
                "unknown correlation method '{}' (expected pearson, spearman, ols or kalman)",
                other
            ))),
        }
    }
}

/// One ranked pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairCorrelationRecord {
    pub ticker_a: String,
    pub ticker_b: String,
    #[serde(with = "float_serde")]
    pub score: f64,
    pub method: CorrelationMethod,
}

impl PartialEq for PairCorrelationRecord {
    fn eq(&self, other: &Self) -> bool {
        self.ticker_a == other.ticker_a
            && self.ticker_b == other.ticker_b
            && self.method == other.method
            && float_eq(self.score, other.score)
    }
}

/// A ranked pair annotated with its spread's mean-reversion speed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPair {
    #[serde(flatten)]
    pub record: PairCorrelationRecord,
    pub mean_reversion: MeanReversionEstimate,
}

/// Ornstein-Uhlenbeck speed estimate for a pair's return spread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeanReversionEstimate {
    /// Mean-reversion speed per day
    #[serde(with = "float_serde")]
    pub theta: f64,
    /// True when the regression could not be fit and `theta` is the default
    pub is_fallback: bool,
    /// AR(1) slope on the lagged spread
    #[serde(with = "float_serde")]
    pub beta: f64,
    #[serde(with = "float_serde")]
    pub intercept: f64,
    #[serde(with = "float_serde")]
    pub beta_t_stat: f64,
    #[serde(with = "float_serde")]
    pub intercept_t_stat: f64,
    /// ln(2) / theta in days, NaN unless theta > 0
    #[serde(with = "float_serde")]
    pub half_life: f64,
    pub observations: usize,
}

impl MeanReversionEstimate {
    /// Default-speed result used when the regression is degenerate
    pub fn fallback(theta: f64, observations: usize) -> Self {
        Self {
            theta,
            is_fallback: true,
            beta: f64::NAN,
            intercept: f64::NAN,
            beta_t_stat: f64::NAN,
            intercept_t_stat: f64::NAN,
            half_life: f64::NAN,
            observations,
        }
    }

    pub fn is_mean_reverting(&self) -> bool {
        !self.is_fallback && self.theta > 0.0
    }
}

impl PartialEq for MeanReversionEstimate {
    fn eq(&self, other: &Self) -> bool {
        self.is_fallback == other.is_fallback
            && self.observations == other.observations
            && float_eq(self.theta, other.theta)
            && float_eq(self.beta, other.beta)
            && float_eq(self.intercept, other.intercept)
            && float_eq(self.beta_t_stat, other.beta_t_stat)
            && float_eq(self.intercept_t_stat, other.intercept_t_stat)
            && float_eq(self.half_life, other.half_life)
    }
}

/// Risk-adjusted statistics of a cumulative PnL curve
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PerformanceSummary {
    #[serde(with = "float_serde")]
    pub sharpe_ratio: f64,
    #[serde(with = "float_serde")]
    pub sortino_ratio: f64,
    /// Most negative `cum / running_max - 1`, 0 for a curve that never declines.
    /// `-inf` when the curve falls below a running max of exactly 0 (a PnL
    /// curve starting at 0 that first loses money); serialized as `"-inf"`.
    #[serde(with = "float_serde")]
    pub max_drawdown: f64,
    #[serde(with = "float_serde")]
    pub annualized_return: f64,
    #[serde(with = "float_serde")]
    pub annualized_volatility: f64,
    #[serde(with = "float_serde")]
    pub downside_volatility: f64,
    /// Number of daily PnL observations (cumulative length - 1)
    pub trading_days: usize,
}

impl PartialEq for PerformanceSummary {
    fn eq(&self, other: &Self) -> bool {
        self.trading_days == other.trading_days
            && float_eq(self.sharpe_ratio, other.sharpe_ratio)
            && float_eq(self.sortino_ratio, other.sortino_ratio)
            && float_eq(self.max_drawdown, other.max_drawdown)
            && float_eq(self.annualized_return, other.annualized_return)
            && float_eq(self.annualized_volatility, other.annualized_volatility)
            && float_eq(self.downside_volatility, other.downside_volatility)
    }
}

impl fmt::Display for PerformanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sharpe {:.2} | Sortino {:.2} | Max Drawdown {:.2}",
            self.sharpe_ratio, self.sortino_ratio, self.max_drawdown
        )
    }
}

/// Per-date backtest detail for one pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestRow {
    pub date: NaiveDate,
    pub price_a: f64,
    pub price_b: f64,
    /// One-day price change of each leg
    pub change_a: f64,
    pub change_b: f64,
    /// Next day's price change, the move scored by a position opened today
    pub next_change_a: f64,
    pub next_change_b: f64,
    pub ratio: f64,
    pub rolling_mean: f64,
    pub rolling_std: f64,
    pub zscore: f64,
    pub raw_long: bool,
    pub raw_short: bool,
    /// Signals after hold extension
    pub long_signal: bool,
    pub short_signal: bool,
    pub long_pnl: f64,
    pub short_pnl: f64,
    pub pnl: f64,
    pub cumulative_pnl: f64,
}

/// Rolling correlation of the two legs' simple returns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingCorrelationPoint {
    pub date: NaiveDate,
    pub correlation: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing() {
        assert_eq!("pearson".parse::<CorrelationMethod>().unwrap(), CorrelationMethod::Pearson);
        assert_eq!("OLS".parse::<CorrelationMethod>().unwrap(), CorrelationMethod::Ols);
        assert_eq!(" Kalman ".parse::<CorrelationMethod>().unwrap(), CorrelationMethod::Kalman);
        assert!(matches!(
            "kendall".parse::<CorrelationMethod>(),
            Err(AnalyticsError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_method_round_trips_through_display() {
        for method in CorrelationMethod::ALL {
            assert_eq!(method.to_string().parse::<CorrelationMethod>().unwrap(), method);
        }
        assert!(!CorrelationMethod::Ols.is_symmetric());
        assert!(CorrelationMethod::Kalman.is_symmetric());
    }

    #[test]
    fn test_summary_equality_treats_nan_as_equal() {
        let summary = PerformanceSummary {
            sharpe_ratio: f64::NAN,
            sortino_ratio: f64::NAN,
            max_drawdown: 0.0,
            annualized_return: 0.0,
            annualized_volatility: 0.0,
            downside_volatility: f64::NAN,
            trading_days: 3,
        };
        assert_eq!(summary, summary);
        assert_eq!(summary.to_string(), "Sharpe NaN | Sortino NaN | Max Drawdown 0.00");
    }

    #[test]
    fn test_summary_json_keeps_nan() {
        let summary = PerformanceSummary {
            sharpe_ratio: f64::NAN,
            sortino_ratio: 1.25,
            max_drawdown: -0.5,
            annualized_return: 0.1,
            annualized_volatility: 0.2,
            downside_volatility: 0.08,
            trading_days: 10,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains(r#""sharpe_ratio":"NaN""#));

        let back: PerformanceSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }

    #[test]
    fn test_fallback_estimate() {
        let est = MeanReversionEstimate::fallback(0.5, 1);
        assert!(est.is_fallback);
        assert!(!est.is_mean_reverting());
        assert_eq!(est.theta, 0.5);
        assert!(est.beta.is_nan());
    }
}
