//! Backtest Simulator
//!
//! Replays the ratio z-score threshold rule on one pair:
//!
//! 1. Slice both legs to `[start - lookback business days, end]`
//! 2. Price changes, next-day changes, ratio `A / B`, rolling ratio z-score
//! 3. Drop rows where any of those is undefined
//! 4. Raw triggers: long below the low band, short above the high band
//! 5. Hold extension: each trigger keeps its side on for `hold_days`
//!    business days, trigger day included
//! 6. Long PnL `next_a - next_b`, short PnL `next_b - next_a`, running sum
//!
//! PnL is in price units per one-share-each position; there are no
//! transaction costs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::performance::PerformanceEvaluator;
use crate::domain::{
    add_business_days, simple_returns, sub_business_days, AnalyticsError, AnalyticsResult,
    BacktestRow, PerformanceSummary, PricePanel, RollingCorrelationPoint,
};
use crate::strategy::{stats, BacktestParams, ZScoreGate};

/// Full backtest output for one pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub ticker_a: String,
    pub ticker_b: String,
    pub params: BacktestParams,
    pub rows: Vec<BacktestRow>,
    pub performance: PerformanceSummary,
    /// Rolling correlation of the legs' simple returns over `lookback` rows
    pub rolling_correlation: Vec<RollingCorrelationPoint>,
}

impl BacktestReport {
    pub fn final_pnl(&self) -> f64 {
        self.rows.last().map(|r| r.cumulative_pnl).unwrap_or(0.0)
    }

    pub fn long_days(&self) -> usize {
        self.rows.iter().filter(|r| r.long_signal).count()
    }

    pub fn short_days(&self) -> usize {
        self.rows.iter().filter(|r| r.short_signal).count()
    }
}

/// Pair threshold-rule simulator
#[derive(Debug, Clone, Default)]
pub struct BacktestSimulator {
    evaluator: PerformanceEvaluator,
}

impl BacktestSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_evaluator(mut self, evaluator: PerformanceEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Run the threshold rule for `ticker_a / ticker_b` over `[start, end]`
    ///
    /// # Errors
    /// - `InvalidArgument` for identical tickers, `start > end` or bad params
    /// - `UnknownTicker` when a leg is not in the panel
    /// - `InsufficientData` when no row survives warm-up and gap removal
    pub fn run(
        &self,
        panel: &PricePanel,
        ticker_a: &str,
        ticker_b: &str,
        start: NaiveDate,
        end: NaiveDate,
        params: &BacktestParams,
    ) -> AnalyticsResult<BacktestReport> {
        params.validate()?;
        if ticker_a == ticker_b {
            return Err(AnalyticsError::InvalidArgument(format!(
                "backtest needs two distinct tickers, got '{}' twice",
                ticker_a
            )));
        }
        if start > end {
            return Err(AnalyticsError::InvalidArgument(format!(
                "start {} is after end {}",
                start, end
            )));
        }

        let window_start = sub_business_days(start, params.lookback);
        let legs = panel.select(&[ticker_a, ticker_b])?.slice(window_start, end);
        debug!(
            pair = %format!("{}/{}", ticker_a, ticker_b),
            from = %window_start,
            to = %end,
            rows = legs.len(),
            "Sliced backtest window"
        );

        let rows = build_rows(&legs, params);
        if rows.is_empty() {
            return Err(AnalyticsError::InsufficientData(format!(
                "no rows left for {}/{} between {} and {} after a {}-day warm-up",
                ticker_a, ticker_b, start, end, params.lookback
            )));
        }

        let cumulative: Vec<f64> = rows.iter().map(|r| r.cumulative_pnl).collect();
        let performance = self.evaluator.evaluate(&cumulative);
        let rolling_correlation = leg_rolling_correlation(&rows, params.lookback);

        info!(
            pair = %format!("{}/{}", ticker_a, ticker_b),
            rows = rows.len(),
            final_pnl = cumulative.last().copied().unwrap_or(0.0),
            sharpe = performance.sharpe_ratio,
            "Backtest complete"
        );

        Ok(BacktestReport {
            ticker_a: ticker_a.to_string(),
            ticker_b: ticker_b.to_string(),
            params: *params,
            rows,
            performance,
            rolling_correlation,
        })
    }
}

/// Rows that survive warm-up and gap removal, signals and PnL filled in
fn build_rows(legs: &PricePanel, params: &BacktestParams) -> Vec<BacktestRow> {
    let dates = legs.dates();
    let (price_a, price_b) = (legs.column_at(0), legs.column_at(1));

    let change_a = price_changes(price_a);
    let change_b = price_changes(price_b);
    let ratio: Vec<f64> = price_a
        .iter()
        .zip(price_b.iter())
        .map(|(a, b)| {
            let r = a / b;
            if r.is_finite() {
                r
            } else {
                f64::NAN
            }
        })
        .collect();
    let zscores = ZScoreGate::new(params.lookback).compute(&ratio);

    let mut rows: Vec<BacktestRow> = Vec::with_capacity(dates.len());
    for t in 0..dates.len() {
        let next_a = change_a.get(t + 1).copied().unwrap_or(f64::NAN);
        let next_b = change_b.get(t + 1).copied().unwrap_or(f64::NAN);
        let z = zscores[t];

        let defined = [
            price_a[t], price_b[t], change_a[t], change_b[t], next_a, next_b, z.value, z.mean,
            z.std_dev, z.z_score,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !defined {
            continue;
        }

        rows.push(BacktestRow {
            date: dates[t],
            price_a: price_a[t],
            price_b: price_b[t],
            change_a: change_a[t],
            change_b: change_b[t],
            next_change_a: next_a,
            next_change_b: next_b,
            ratio: z.value,
            rolling_mean: z.mean,
            rolling_std: z.std_dev,
            zscore: z.z_score,
            raw_long: z.is_below(params.low_quantile),
            raw_short: z.is_above(params.high_quantile),
            long_signal: false,
            short_signal: false,
            long_pnl: 0.0,
            short_pnl: 0.0,
            pnl: 0.0,
            cumulative_pnl: 0.0,
        });
    }

    let row_dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
    let raw_long: Vec<bool> = rows.iter().map(|r| r.raw_long).collect();
    let raw_short: Vec<bool> = rows.iter().map(|r| r.raw_short).collect();
    let long = extend_holds(&row_dates, &raw_long, params.hold_days);
    let short = extend_holds(&row_dates, &raw_short, params.hold_days);

    let mut cumulative = 0.0;
    for (row, (long_on, short_on)) in rows.iter_mut().zip(long.into_iter().zip(short)) {
        let spread_move = row.next_change_a - row.next_change_b;
        row.long_signal = long_on;
        row.short_signal = short_on;
        row.long_pnl = if long_on { spread_move } else { 0.0 };
        row.short_pnl = if short_on { -spread_move } else { 0.0 };
        row.pnl = row.long_pnl + row.short_pnl;
        cumulative += row.pnl;
        row.cumulative_pnl = cumulative;
    }

    rows
}

/// `price[t] - price[t-1]`, NaN on the first row
fn price_changes(prices: &[f64]) -> Vec<f64> {
    std::iter::once(f64::NAN)
        .chain(prices.windows(2).map(|w| w[1] - w[0]))
        .collect()
}

/// Extend each trigger over `hold_days` business days, trigger day included
///
/// Windows are measured from their own trigger date and do not stack: a
/// later trigger only pushes the expiry out to its own window end.
pub fn extend_holds(dates: &[NaiveDate], triggers: &[bool], hold_days: usize) -> Vec<bool> {
    let span = hold_days.saturating_sub(1) as i64;
    let mut expiry: Option<NaiveDate> = None;

    dates
        .iter()
        .zip(triggers.iter())
        .map(|(&date, &fired)| {
            if fired {
                let until = add_business_days(date, span);
                expiry = Some(expiry.map_or(until, |e| e.max(until)));
            }
            expiry.is_some_and(|e| date <= e)
        })
        .collect()
}

/// Rolling correlation of the legs' simple returns over the surviving rows
fn leg_rolling_correlation(rows: &[BacktestRow], window: usize) -> Vec<RollingCorrelationPoint> {
    let prices_a: Vec<f64> = rows.iter().map(|r| r.price_a).collect();
    let prices_b: Vec<f64> = rows.iter().map(|r| r.price_b).collect();
    let returns_a = simple_returns(&prices_a);
    let returns_b = simple_returns(&prices_b);

    stats::rolling_correlation(&returns_a, &returns_b, window)
        .into_iter()
        .zip(rows.iter().skip(1))
        .filter(|(correlation, _)| !correlation.is_nan())
        .map(|(correlation, row)| RollingCorrelationPoint {
            date: row.date,
            correlation,
        })
        .collect()
}
