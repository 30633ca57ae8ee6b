//! Backtest Layer - Pair threshold rule replay and scoring
//!
//! - `simulator`: z-score threshold rule with hold extension, row-level detail
//! - `performance`: Sharpe, Sortino and max drawdown of the PnL curve

pub mod performance;
pub mod simulator;

pub use performance::{PerformanceEvaluator, TRADING_DAYS_PER_YEAR, VOLATILITY_EPSILON};
pub use simulator::{extend_holds, BacktestReport, BacktestSimulator};
