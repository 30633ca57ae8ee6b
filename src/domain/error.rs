//! Analytics error type shared by every core operation.

use thiserror::Error;

/// Result alias for core analytics operations
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Failures surfaced by the analytics core
///
/// Numeric degeneracy (zero volatility, undefined correlation) is NOT an
/// error: it is reported as `f64::NAN` in the affected field. Regression
/// non-convergence is reported through `MeanReversionEstimate::is_fallback`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    /// Broken panel preconditions (shape, ordering, duplicates)
    #[error("Malformed price panel: {0}")]
    MalformedPanel(String),
}

impl AnalyticsError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        AnalyticsError::InvalidArgument(reason.into())
    }

    pub fn insufficient(reason: impl Into<String>) -> Self {
        AnalyticsError::InsufficientData(reason.into())
    }
}
