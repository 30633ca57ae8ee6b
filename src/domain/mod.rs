//! Domain Layer - Core data model for pair analytics
//!
//! Pure types with no I/O:
//! - `panel`: `PricePanel` and the derived `ReturnsPanel`
//! - `calendar`: business-day arithmetic for warm-up and hold windows
//! - `records`: ranked pairs, backtest rows, performance and OU estimates
//! - `error`: `AnalyticsError`
//! - `float_serde`: serialization that keeps NaN distinguishable from missing

pub mod calendar;
pub mod error;
pub mod float_serde;
pub mod panel;
pub mod records;

pub use calendar::{add_business_days, is_business_day, sub_business_days};
pub use error::{AnalyticsError, AnalyticsResult};
pub use panel::{simple_returns, PricePanel, ReturnsPanel};
pub use records::{
    AnnotatedPair, BacktestRow, CorrelationMethod, MeanReversionEstimate, PairCorrelationRecord,
    PerformanceSummary, RollingCorrelationPoint,
};
