//! CSV Price Source
//!
//! Reads a wide close-price table:
//!
//! ```text
//! Date,AAPL,MSFT,XOM
//! 2024-01-02,185.64,370.87,100.12
//! 2024-01-03,184.25,,99.87
//! ```
//!
//! The first column is the date, every other column a ticker. Empty cells
//! (and `NaN`/`NA`/`null`) are missing observations. Rows may appear in any
//! order; they are sorted by date before the panel is built.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::domain::PricePanel;
use crate::ports::{MarketDataError, PriceDataPort, PriceQuery};

const MISSING_MARKERS: [&str; 5] = ["", "nan", "na", "null", "n/a"];

/// File-backed price source, parsed once on first use
#[derive(Debug)]
pub struct CsvPriceData {
    path: PathBuf,
    panel: OnceCell<PricePanel>,
}

impl CsvPriceData {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            panel: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn panel(&self) -> Result<&PricePanel, MarketDataError> {
        self.panel
            .get_or_try_init(|| async {
                let content = tokio::fs::read_to_string(&self.path).await?;
                let panel = parse_wide_csv(&content)?;
                info!(
                    path = %self.path.display(),
                    rows = panel.len(),
                    tickers = panel.tickers().len(),
                    "Loaded price file"
                );
                Ok::<_, MarketDataError>(panel)
            })
            .await
    }
}

#[async_trait]
impl PriceDataPort for CsvPriceData {
    async fn fetch_prices(&self, query: PriceQuery) -> Result<PricePanel, MarketDataError> {
        let panel = self.panel().await?;
        debug!(start = %query.start, end = %query.end, "Serving prices from CSV");
        query.apply(panel)
    }

    async fn list_tickers(&self) -> Result<Vec<String>, MarketDataError> {
        Ok(self.panel().await?.tickers().to_vec())
    }
}

/// Parse a wide CSV document into a panel
pub fn parse_wide_csv(content: &str) -> Result<PricePanel, MarketDataError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| MarketDataError::ParseError(format!("failed to read header: {}", e)))?
        .clone();
    if headers.len() < 2 {
        return Err(MarketDataError::ParseError(
            "expected a date column followed by at least one ticker column".to_string(),
        ));
    }
    let tickers: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| MarketDataError::ParseError(format!("row {}: {}", line + 2, e)))?;
        let date = parse_date(record.get(0).unwrap_or_default())
            .ok_or_else(|| MarketDataError::ParseError(format!("row {}: bad date", line + 2)))?;

        let values = tickers
            .iter()
            .enumerate()
            .map(|(i, ticker)| parse_price(record.get(i + 1).unwrap_or_default(), ticker, line + 2))
            .collect::<Result<Vec<f64>, _>>()?;
        rows.push((date, values));
    }

    rows.sort_by_key(|(date, _)| *date);
    Ok(PricePanel::from_rows(tickers, rows)?)
}

/// `YYYY-MM-DD`, optionally followed by a time component
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

fn parse_price(raw: &str, ticker: &str, line: usize) -> Result<f64, MarketDataError> {
    if MISSING_MARKERS.contains(&raw.to_ascii_lowercase().as_str()) {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>().map_err(|_| {
        MarketDataError::ParseError(format!(
            "row {}: '{}' is not a price for {}",
            line, raw, ticker
        ))
    })
}
