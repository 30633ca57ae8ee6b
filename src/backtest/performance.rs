//! Performance Evaluator
//!
//! Annualized risk-adjusted statistics of a cumulative PnL curve. The curve is
//! in price units (not a compounding equity curve), so daily PnL is the first
//! difference and annualization scales by sqrt(252) only.
//!
//! Degenerate ratios are `NaN`, never a silent zero.

use tracing::debug;

use crate::domain::PerformanceSummary;
use crate::strategy::stats;

/// Trading days per year used for annualization
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
/// Volatility at or below this makes Sharpe/Sortino undefined
pub const VOLATILITY_EPSILON: f64 = 1e-12;

/// Sharpe / Sortino / max drawdown calculator
#[derive(Debug, Clone, Copy)]
pub struct PerformanceEvaluator {
    periods_per_year: f64,
}

impl Default for PerformanceEvaluator {
    fn default() -> Self {
        Self {
            periods_per_year: TRADING_DAYS_PER_YEAR,
        }
    }
}

impl PerformanceEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summarize a cumulative PnL series
    pub fn evaluate(&self, cumulative: &[f64]) -> PerformanceSummary {
        let daily: Vec<f64> = cumulative
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|d| d.is_finite())
            .collect();

        let scale = self.periods_per_year.sqrt();
        let annualized_return = stats::mean(&daily) * scale;
        let annualized_volatility = stats::std_dev(&daily) * scale;

        let downside: Vec<f64> = daily.iter().copied().filter(|d| *d < 0.0).collect();
        let downside_volatility = stats::std_dev(&downside) * scale;

        let summary = PerformanceSummary {
            sharpe_ratio: ratio(annualized_return, annualized_volatility),
            sortino_ratio: ratio(annualized_return, downside_volatility),
            max_drawdown: max_drawdown(cumulative),
            annualized_return,
            annualized_volatility,
            downside_volatility,
            trading_days: daily.len(),
        };

        debug!(
            days = summary.trading_days,
            sharpe = summary.sharpe_ratio,
            sortino = summary.sortino_ratio,
            max_drawdown = summary.max_drawdown,
            "Evaluated PnL curve"
        );
        summary
    }
}

fn ratio(numerator: f64, volatility: f64) -> f64 {
    if volatility.is_finite() && volatility > VOLATILITY_EPSILON {
        numerator / volatility
    } else {
        f64::NAN
    }
}

/// Most negative `cum[t] / running_max[t] - 1`
///
/// Points where the ratio is undefined (running max of zero over zero) are
/// skipped; a curve that never declines has a drawdown of 0. A negative value
/// under a running max of 0 gives `-inf`.
pub fn max_drawdown(cumulative: &[f64]) -> f64 {
    let mut running_max = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;

    for &value in cumulative.iter().filter(|v| !v.is_nan()) {
        running_max = running_max.max(value);
        let drawdown = value / running_max - 1.0;
        if !drawdown.is_nan() {
            worst = worst.min(drawdown);
        }
    }
    worst
}
