//! Strategy Layer - Pair screening and statistical modeling
//!
//! Numeric building blocks for pair selection and the threshold backtest:
//! - `correlation`: pair ranking by Pearson, Spearman, OLS beta or Kalman
//! - `kalman`: two-dimensional forward filter used by the Kalman screen
//! - `ou_process`: Ornstein-Uhlenbeck speed of a return spread
//! - `zscore_gate`: rolling z-score of the price ratio
//! - `params`: backtest threshold rule parameters
//! - `stats`: NaN-tolerant descriptive statistics

pub mod correlation;
pub mod kalman;
pub mod ou_process;
pub mod params;
pub mod stats;
pub mod zscore_gate;

pub use correlation::CorrelationScreen;
pub use kalman::{KalmanCoMovementEstimator, KalmanConfig};
pub use ou_process::{MeanReversionEstimator, DEFAULT_FALLBACK_THETA};
pub use params::BacktestParams;
pub use zscore_gate::{ZScoreGate, ZScoreResult, STD_EPSILON};
