//! Price Panel and Returns Transform
//!
//! A `PricePanel` is a date-indexed table with one column per ticker.
//! Missing observations are stored as `f64::NAN`. Every column shares the
//! same strictly ascending date index; violations are rejected at
//! construction time.
//!
//! `ReturnsPanel` can only be obtained from `PricePanel::returns`, so it is
//! always consistent with the prices it was derived from.

use chrono::NaiveDate;
use std::collections::HashSet;

use super::error::{AnalyticsError, AnalyticsResult};

/// Date-indexed prices, one column per ticker
#[derive(Debug, Clone, PartialEq)]
pub struct PricePanel {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    /// Column-major values, `columns[c][t]`
    columns: Vec<Vec<f64>>,
}

impl PricePanel {
    /// Build a panel from column-major data
    ///
    /// # Errors
    /// `MalformedPanel` when dates are not strictly ascending, tickers repeat,
    /// or a column length differs from the date index.
    pub fn new(
        dates: Vec<NaiveDate>,
        tickers: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> AnalyticsResult<Self> {
        validate_shape(&dates, &tickers, &columns)?;
        Ok(Self { dates, tickers, columns })
    }

    /// Build a panel from row-major data (one `Vec` per date)
    pub fn from_rows(
        tickers: Vec<String>,
        rows: Vec<(NaiveDate, Vec<f64>)>,
    ) -> AnalyticsResult<Self> {
        let mut dates = Vec::with_capacity(rows.len());
        let mut columns = vec![Vec::with_capacity(rows.len()); tickers.len()];

        for (date, values) in rows {
            if values.len() != tickers.len() {
                return Err(AnalyticsError::MalformedPanel(format!(
                    "row {} has {} values for {} tickers",
                    date,
                    values.len(),
                    tickers.len()
                )));
            }
            dates.push(date);
            for (column, value) in columns.iter_mut().zip(values) {
                column.push(value);
            }
        }

        Self::new(dates, tickers, columns)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Position of a ticker in column order
    pub fn ticker_index(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|t| t == ticker)
    }

    pub fn column(&self, ticker: &str) -> Option<&[f64]> {
        self.ticker_index(ticker).map(|i| self.columns[i].as_slice())
    }

    /// Column by position; panics if out of range
    pub fn column_at(&self, index: usize) -> &[f64] {
        &self.columns[index]
    }

    /// Column lookup that reports unknown tickers as an error
    pub fn require_column(&self, ticker: &str) -> AnalyticsResult<&[f64]> {
        self.column(ticker)
            .ok_or_else(|| AnalyticsError::UnknownTicker(ticker.to_string()))
    }

    /// Rows with `start <= date <= end`
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> PricePanel {
        let from = self.dates.partition_point(|d| *d < start);
        let to = self.dates.partition_point(|d| *d <= end).max(from);

        PricePanel {
            dates: self.dates[from..to].to_vec(),
            tickers: self.tickers.clone(),
            columns: self.columns.iter().map(|c| c[from..to].to_vec()).collect(),
        }
    }

    /// Keep only the given tickers, in the given order
    pub fn select(&self, tickers: &[&str]) -> AnalyticsResult<PricePanel> {
        let mut names = Vec::with_capacity(tickers.len());
        let mut columns = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            columns.push(self.require_column(ticker)?.to_vec());
            names.push(ticker.to_string());
        }
        PricePanel::new(self.dates.clone(), names, columns)
    }

    /// Daily simple returns, first row dropped
    ///
    /// `returns[t] = price[t] / price[t-1] - 1`. A missing, zero or
    /// non-finite prior price, or a missing current price, gives `NaN`.
    pub fn returns(&self) -> ReturnsPanel {
        let dates = self.dates.iter().skip(1).copied().collect();
        let columns = self.columns.iter().map(|c| simple_returns(c)).collect();

        ReturnsPanel {
            dates,
            tickers: self.tickers.clone(),
            columns,
        }
    }
}

/// Simple returns of a single series (length `n - 1`)
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| {
            let (prev, curr) = (w[0], w[1]);
            if !prev.is_finite() || prev == 0.0 || !curr.is_finite() {
                f64::NAN
            } else {
                curr / prev - 1.0
            }
        })
        .collect()
}

/// Daily simple returns derived from a `PricePanel`
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnsPanel {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl ReturnsPanel {
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn ticker_index(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|t| t == ticker)
    }

    pub fn column(&self, ticker: &str) -> Option<&[f64]> {
        self.ticker_index(ticker).map(|i| self.columns[i].as_slice())
    }

    pub fn column_at(&self, index: usize) -> &[f64] {
        &self.columns[index]
    }

    pub fn require_column(&self, ticker: &str) -> AnalyticsResult<&[f64]> {
        self.column(ticker)
            .ok_or_else(|| AnalyticsError::UnknownTicker(ticker.to_string()))
    }

    /// Indices of columns that hold at least one defined return
    pub fn populated_columns(&self) -> Vec<usize> {
        (0..self.columns.len())
            .filter(|&i| self.columns[i].iter().any(|v| v.is_finite()))
            .collect()
    }
}

fn validate_shape(
    dates: &[NaiveDate],
    tickers: &[String],
    columns: &[Vec<f64>],
) -> AnalyticsResult<()> {
    if tickers.len() != columns.len() {
        return Err(AnalyticsError::MalformedPanel(format!(
            "{} tickers but {} columns",
            tickers.len(),
            columns.len()
        )));
    }

    let mut seen = HashSet::with_capacity(tickers.len());
    for ticker in tickers {
        if !seen.insert(ticker.as_str()) {
            return Err(AnalyticsError::MalformedPanel(format!(
                "duplicate ticker '{}'",
                ticker
            )));
        }
    }

    for (ticker, column) in tickers.iter().zip(columns) {
        if column.len() != dates.len() {
            return Err(AnalyticsError::MalformedPanel(format!(
                "column '{}' has {} values for {} dates",
                ticker,
                column.len(),
                dates.len()
            )));
        }
    }

    if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
        return Err(AnalyticsError::MalformedPanel(format!(
            "dates must be strictly ascending ({} followed by {})",
            w[0], w[1]
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sample_panel() -> PricePanel {
        PricePanel::new(
            vec![d(1), d(2), d(3), d(4), d(5)],
            vec!["X".into(), "Y".into()],
            vec![
                vec![100.0, 102.0, 101.0, 105.0, 107.0],
                vec![50.0, 49.0, 50.0, 52.0, 53.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_returns_drop_first_row() {
        let returns = sample_panel().returns();
        assert_eq!(returns.len(), 4);
        assert_eq!(returns.dates()[0], d(2));
        assert_relative_eq!(returns.column("X").unwrap()[0], 0.02, epsilon = 1e-12);
        assert_relative_eq!(returns.column("Y").unwrap()[0], -0.02, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_or_missing_prior_gives_nan() {
        let r = simple_returns(&[0.0, 10.0, f64::NAN, 12.0, 13.0]);
        assert!(r[0].is_nan());
        assert!(r[1].is_nan());
        assert!(r[2].is_nan());
        assert_relative_eq!(r[3], 13.0 / 12.0 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_unsorted_dates() {
        let result = PricePanel::new(
            vec![d(2), d(1)],
            vec!["X".into()],
            vec![vec![1.0, 2.0]],
        );
        assert!(matches!(result, Err(AnalyticsError::MalformedPanel(_))));
    }

    #[test]
    fn test_rejects_duplicate_dates_and_tickers() {
        let dup_dates = PricePanel::new(vec![d(1), d(1)], vec!["X".into()], vec![vec![1.0, 2.0]]);
        assert!(dup_dates.is_err());

        let dup_tickers = PricePanel::new(
            vec![d(1)],
            vec!["X".into(), "X".into()],
            vec![vec![1.0], vec![2.0]],
        );
        assert!(dup_tickers.is_err());
    }

    #[test]
    fn test_rejects_ragged_columns() {
        let result = PricePanel::new(
            vec![d(1), d(2)],
            vec!["X".into(), "Y".into()],
            vec![vec![1.0, 2.0], vec![1.0]],
        );
        assert!(matches!(result, Err(AnalyticsError::MalformedPanel(_))));
    }

    #[test]
    fn test_slice_is_inclusive() {
        let panel = sample_panel();
        let sliced = panel.slice(d(2), d(4));
        assert_eq!(sliced.dates(), &[d(2), d(3), d(4)]);
        assert_eq!(sliced.column("X").unwrap(), &[102.0, 101.0, 105.0]);

        let empty = panel.slice(d(10), d(20));
        assert!(empty.is_empty());
        assert_eq!(empty.tickers().len(), 2);
    }

    #[test]
    fn test_from_rows_and_select() {
        let panel = PricePanel::from_rows(
            vec!["A".into(), "B".into(), "C".into()],
            vec![(d(1), vec![1.0, 2.0, 3.0]), (d(2), vec![1.5, 2.5, 3.5])],
        )
        .unwrap();

        let selected = panel.select(&["C", "A"]).unwrap();
        assert_eq!(selected.tickers(), &["C".to_string(), "A".to_string()]);
        assert_eq!(selected.column_at(0), &[3.0, 3.5]);

        assert!(matches!(
            panel.select(&["Z"]),
            Err(AnalyticsError::UnknownTicker(_))
        ));
    }

    #[test]
    fn test_populated_columns_skips_empty() {
        let panel = PricePanel::new(
            vec![d(1), d(2), d(3)],
            vec!["A".into(), "B".into()],
            vec![vec![1.0, 1.1, 1.2], vec![f64::NAN, f64::NAN, f64::NAN]],
        )
        .unwrap();
        assert_eq!(panel.returns().populated_columns(), vec![0]);
    }
}
