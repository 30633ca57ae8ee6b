//! Synthetic Price Source
//!
//! Seeded universe of correlated random walks on business days. Each ticker
//! loads on a common market factor plus one of three sector factors, so the
//! screen has genuinely stronger and weaker pairs to rank. Identical seeds
//! give identical panels.

use async_trait::async_trait;
use chrono::NaiveDate;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Normal;
use tracing::debug;

use crate::config::SyntheticSection;
use crate::domain::{add_business_days, sub_business_days, PricePanel};
use crate::ports::{MarketDataError, PriceDataPort, PriceQuery};

const SECTORS: usize = 3;
const DAILY_DRIFT: f64 = 0.0002;
const MARKET_VOL: f64 = 0.008;
const SECTOR_VOL: f64 = 0.010;
const IDIOSYNCRATIC_VOL: f64 = 0.006;
const START_PRICE: f64 = 100.0;

/// In-memory generated universe
#[derive(Debug, Clone)]
pub struct SyntheticPriceData {
    panel: PricePanel,
}

impl SyntheticPriceData {
    /// Generate `tickers` series over `days` business days ending at `end`
    pub fn generate(
        seed: u64,
        tickers: usize,
        days: usize,
        end: NaiveDate,
    ) -> Result<Self, MarketDataError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let shock = Normal::new(0.0, 1.0)
            .map_err(|e| MarketDataError::Unsupported(format!("normal distribution: {}", e)))?;

        let last = add_business_days(end, 0);
        let first = sub_business_days(last, days.saturating_sub(1));
        let dates = business_days_between(first, last);

        let names: Vec<String> = (0..tickers).map(|i| format!("SYN{:02}", i)).collect();
        let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(dates.len()); tickers];
        let mut prices = vec![START_PRICE; tickers];

        for t in 0..dates.len() {
            let market = shock.sample(&mut rng);
            let sectors: Vec<f64> = (0..SECTORS).map(|_| shock.sample(&mut rng)).collect();

            for (i, column) in columns.iter_mut().enumerate() {
                if t > 0 {
                    let r = DAILY_DRIFT
                        + MARKET_VOL * market
                        + SECTOR_VOL * sectors[i % SECTORS]
                        + IDIOSYNCRATIC_VOL * shock.sample(&mut rng);
                    prices[i] *= 1.0 + r;
                }
                column.push(prices[i]);
            }
        }

        debug!(seed, tickers, rows = dates.len(), "Generated synthetic universe");
        Ok(Self {
            panel: PricePanel::new(dates, names, columns)?,
        })
    }

    /// Generate from the `[synthetic]` config section
    pub fn from_config(section: &SyntheticSection) -> Result<Self, MarketDataError> {
        let end = match &section.end_date {
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|e| MarketDataError::ParseError(format!("synthetic end_date: {}", e)))?,
            None => default_end_date()?,
        };
        Self::generate(section.seed, section.tickers, section.days, end)
    }

    pub fn panel(&self) -> &PricePanel {
        &self.panel
    }
}

#[async_trait]
impl PriceDataPort for SyntheticPriceData {
    async fn fetch_prices(&self, query: PriceQuery) -> Result<PricePanel, MarketDataError> {
        query.apply(&self.panel)
    }

    async fn list_tickers(&self) -> Result<Vec<String>, MarketDataError> {
        Ok(self.panel.tickers().to_vec())
    }
}

fn default_end_date() -> Result<NaiveDate, MarketDataError> {
    NaiveDate::from_ymd_opt(2024, 12, 31)
        .ok_or_else(|| MarketDataError::Unsupported("invalid default end date".to_string()))
}

fn business_days_between(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = first;
    while current <= last {
        dates.push(current);
        current = add_business_days(current, 1);
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::is_business_day;

    fn end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
    }

    #[test]
    fn test_shape_and_calendar() {
        let source = SyntheticPriceData::generate(7, 5, 120, end()).unwrap();
        let panel = source.panel();

        assert_eq!(panel.len(), 120);
        assert_eq!(panel.tickers().len(), 5);
        assert_eq!(panel.last_date(), Some(end()));
        assert!(panel.dates().iter().all(|d| is_business_day(*d)));
        assert!(panel.column_at(0).iter().all(|p| p.is_finite() && *p > 0.0));
        assert_eq!(panel.column_at(3)[0], START_PRICE);
    }

    #[test]
    fn test_same_seed_same_panel() {
        let a = SyntheticPriceData::generate(11, 4, 60, end()).unwrap();
        let b = SyntheticPriceData::generate(11, 4, 60, end()).unwrap();
        let c = SyntheticPriceData::generate(12, 4, 60, end()).unwrap();
        assert_eq!(a.panel(), b.panel());
        assert_ne!(a.panel(), c.panel());
    }

    #[test]
    fn test_weekend_end_rolls_forward() {
        // 2024-06-29 is a Saturday
        let saturday = NaiveDate::from_ymd_opt(2024, 6, 29).unwrap();
        let source = SyntheticPriceData::generate(1, 2, 10, saturday).unwrap();
        assert_eq!(
            source.panel().last_date(),
            NaiveDate::from_ymd_opt(2024, 7, 1)
        );
    }

    #[test]
    fn test_from_config() {
        let section = SyntheticSection {
            seed: 3,
            tickers: 6,
            days: 30,
            end_date: Some("2024-03-29".to_string()),
        };
        let source = SyntheticPriceData::from_config(&section).unwrap();
        assert_eq!(source.panel().tickers()[5], "SYN05");
        assert_eq!(source.panel().len(), 30);
    }

    #[tokio::test]
    async fn test_port_filters_query() {
        let source = SyntheticPriceData::generate(5, 4, 40, end()).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let query = PriceQuery::new(start, end()).with_tickers(vec!["SYN01".into(), "SYN02".into()]);
        let panel = source.fetch_prices(query).await.unwrap();

        assert_eq!(panel.tickers().len(), 2);
        assert_eq!(panel.first_date(), Some(start));
        assert_eq!(source.list_tickers().await.unwrap().len(), 4);
    }

    #[test]
    fn test_full_query_returns_whole_panel() {
        let source = SyntheticPriceData::generate(9, 3, 25, end()).unwrap();
        let query = PriceQuery::new(NaiveDate::MIN, NaiveDate::MAX);
        let panel = tokio_test::block_on(source.fetch_prices(query)).unwrap();
        assert_eq!(&panel, source.panel());
    }
}
