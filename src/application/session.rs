//! Analytics Session
//!
//! Binds one injected `PricePanel` to the screen, the OU estimator and the
//! backtest simulator. Every operation takes its date window explicitly and
//! slices the panel before transforming, so operations never share state and
//! can run in any order.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use crate::backtest::{BacktestReport, BacktestSimulator};
use crate::config::Config;
use crate::domain::{
    AnalyticsError, AnalyticsResult, AnnotatedPair, CorrelationMethod, MeanReversionEstimate,
    PairCorrelationRecord, PricePanel, ReturnsPanel,
};
use crate::ports::{MarketDataError, PriceDataPort, PriceQuery};
use crate::strategy::{BacktestParams, CorrelationScreen, MeanReversionEstimator};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),
    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

/// Pair analytics over one price panel
#[derive(Debug, Clone)]
pub struct AnalyticsSession {
    panel: PricePanel,
    screen: CorrelationScreen,
    estimator: MeanReversionEstimator,
    simulator: BacktestSimulator,
}

impl AnalyticsSession {
    /// Session with default components
    pub fn new(panel: PricePanel) -> Self {
        Self {
            panel,
            screen: CorrelationScreen::default(),
            estimator: MeanReversionEstimator::default(),
            simulator: BacktestSimulator::default(),
        }
    }

    /// Session with components configured from `config`
    pub fn from_config(panel: PricePanel, config: &Config) -> Self {
        Self::new(panel)
            .with_screen(
                CorrelationScreen::new(config.kalman).with_parallelism(config.screen.parallel),
            )
            .with_estimator(
                MeanReversionEstimator::new()
                    .with_fallback_theta(config.mean_reversion.fallback_theta),
            )
    }

    /// Fetch a panel from `port` and wrap it
    pub async fn load(
        port: &dyn PriceDataPort,
        query: PriceQuery,
        config: &Config,
    ) -> Result<Self, SessionError> {
        debug!(start = %query.start, end = %query.end, "Loading price panel");
        let panel = port.fetch_prices(query).await?;
        if panel.is_empty() {
            return Err(AnalyticsError::insufficient("price source returned no rows").into());
        }

        info!(
            rows = panel.len(),
            tickers = panel.tickers().len(),
            "Price panel loaded"
        );
        Ok(Self::from_config(panel, config))
    }

    pub fn with_screen(mut self, screen: CorrelationScreen) -> Self {
        self.screen = screen;
        self
    }

    pub fn with_estimator(mut self, estimator: MeanReversionEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn with_simulator(mut self, simulator: BacktestSimulator) -> Self {
        self.simulator = simulator;
        self
    }

    pub fn panel(&self) -> &PricePanel {
        &self.panel
    }

    /// Top `top_n` pairs by `method` over `[start, end]`
    pub fn rank_pairs(
        &self,
        method: CorrelationMethod,
        start: NaiveDate,
        end: NaiveDate,
        top_n: usize,
    ) -> AnalyticsResult<Vec<PairCorrelationRecord>> {
        let returns = self.window_returns(start, end)?;
        Ok(self.screen.rank_pairs(&returns, method, top_n))
    }

    /// OU speed of the return spread `a - b` over `[start, end]`
    pub fn estimate_mean_reversion(
        &self,
        ticker_a: &str,
        ticker_b: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AnalyticsResult<MeanReversionEstimate> {
        check_distinct(ticker_a, ticker_b)?;
        self.panel.require_column(ticker_a)?;
        self.panel.require_column(ticker_b)?;

        let returns = self.window_returns(start, end)?;
        self.estimate_on(&returns, ticker_a, ticker_b)
    }

    /// Threshold-rule backtest of `a / b` over `[start, end]`
    pub fn run_backtest(
        &self,
        ticker_a: &str,
        ticker_b: &str,
        start: NaiveDate,
        end: NaiveDate,
        params: &BacktestParams,
    ) -> AnalyticsResult<BacktestReport> {
        self.simulator
            .run(&self.panel, ticker_a, ticker_b, start, end, params)
    }

    /// Top pairs, each annotated with the OU speed of its return spread
    pub fn rank_pairs_with_mean_reversion(
        &self,
        method: CorrelationMethod,
        start: NaiveDate,
        end: NaiveDate,
        top_n: usize,
    ) -> AnalyticsResult<Vec<AnnotatedPair>> {
        let returns = self.window_returns(start, end)?;
        self.screen
            .rank_pairs(&returns, method, top_n)
            .into_iter()
            .map(|record| {
                let mean_reversion =
                    self.estimate_on(&returns, &record.ticker_a, &record.ticker_b)?;
                Ok(AnnotatedPair {
                    record,
                    mean_reversion,
                })
            })
            .collect()
    }

    fn window_returns(&self, start: NaiveDate, end: NaiveDate) -> AnalyticsResult<ReturnsPanel> {
        if start > end {
            return Err(AnalyticsError::InvalidArgument(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        Ok(self.panel.slice(start, end).returns())
    }

    fn estimate_on(
        &self,
        returns: &ReturnsPanel,
        ticker_a: &str,
        ticker_b: &str,
    ) -> AnalyticsResult<MeanReversionEstimate> {
        let a = returns.require_column(ticker_a)?;
        let b = returns.require_column(ticker_b)?;
        Ok(self.estimator.estimate(a, b))
    }
}

fn check_distinct(ticker_a: &str, ticker_b: &str) -> AnalyticsResult<()> {
    if ticker_a == ticker_b {
        return Err(AnalyticsError::InvalidArgument(format!(
            "mean reversion needs two distinct tickers, got '{}' twice",
            ticker_a
        )));
    }
    Ok(())
}
