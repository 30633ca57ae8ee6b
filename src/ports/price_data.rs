use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{AnalyticsError, PricePanel};

/// Price source error type
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data parsing error: {0}")]
    ParseError(String),

    #[error("Invalid price panel: {0}")]
    Panel(#[from] AnalyticsError),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Historical price query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Restrict to these tickers; `None` for the whole universe
    pub tickers: Option<Vec<String>>,
}

impl PriceQuery {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            tickers: None,
        }
    }

    pub fn with_tickers(mut self, tickers: Vec<String>) -> Self {
        self.tickers = Some(tickers);
        self
    }

    /// Narrow an in-memory panel to this query's dates and tickers
    pub fn apply(&self, panel: &PricePanel) -> Result<PricePanel, MarketDataError> {
        let sliced = panel.slice(self.start, self.end);
        match &self.tickers {
            Some(tickers) => {
                let names: Vec<&str> = tickers.iter().map(String::as_str).collect();
                Ok(sliced.select(&names)?)
            }
            None => Ok(sliced),
        }
    }
}

/// Source of daily close prices
///
/// Implementations own acquisition and caching; the analytics core only
/// ever sees the returned `PricePanel`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceDataPort: Send + Sync {
    /// Date-aligned closes for `query`, missing observations as NaN
    async fn fetch_prices(&self, query: PriceQuery) -> Result<PricePanel, MarketDataError>;

    /// Tickers this source can serve
    async fn list_tickers(&self) -> Result<Vec<String>, MarketDataError>;
}
