//! Correlation Screen
//!
//! Ranks ticker pairs of a `ReturnsPanel` by one of four co-movement
//! measures and returns the top N by absolute score.
//!
//! - Pearson / Spearman: pairwise-complete correlation, one record per
//!   unordered pair with `ticker_a < ticker_b`.
//! - OLS: directional beta `cov(x, y) / var(y)` for every ordered pair.
//! - Kalman: Pearson on Kalman-denoised returns, one filter run per
//!   unordered pair via triangular `i < j` iteration.
//!
//! Ties in absolute score keep enumeration order (stable sort), so repeated
//! calls on the same panel return identical rankings.

use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::{debug, info};

use super::kalman::{KalmanCoMovementEstimator, KalmanConfig};
use super::stats;
use crate::domain::{CorrelationMethod, PairCorrelationRecord, ReturnsPanel};

/// Pair ranking engine
#[derive(Debug, Clone)]
pub struct CorrelationScreen {
    kalman: KalmanCoMovementEstimator,
    parallel: bool,
}

impl Default for CorrelationScreen {
    fn default() -> Self {
        Self::new(KalmanConfig::default())
    }
}

impl CorrelationScreen {
    pub fn new(kalman_config: KalmanConfig) -> Self {
        Self {
            kalman: KalmanCoMovementEstimator::new(kalman_config),
            parallel: true,
        }
    }

    /// Fan Kalman pairs out across the rayon pool (default) or run inline
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Top `top_n` pairs by absolute score, descending
    pub fn rank_pairs(
        &self,
        returns: &ReturnsPanel,
        method: CorrelationMethod,
        top_n: usize,
    ) -> Vec<PairCorrelationRecord> {
        debug!(
            method = %method,
            tickers = returns.tickers().len(),
            rows = returns.len(),
            "Ranking pairs"
        );

        let mut records = match method {
            CorrelationMethod::Pearson => self.symmetric_scores(returns, method, stats::pearson_pairwise),
            CorrelationMethod::Spearman => self.symmetric_scores(returns, method, stats::spearman_pairwise),
            CorrelationMethod::Ols => self.ols_betas(returns),
            CorrelationMethod::Kalman => self.kalman_scores(returns),
        };

        sort_by_abs_score(&mut records);
        records.truncate(top_n);

        info!(method = %method, returned = records.len(), "Pair ranking complete");
        records
    }

    /// Unfold a symmetric measure in row-major column order, keeping `name_i < name_j`
    fn symmetric_scores(
        &self,
        returns: &ReturnsPanel,
        method: CorrelationMethod,
        measure: fn(&[f64], &[f64]) -> f64,
    ) -> Vec<PairCorrelationRecord> {
        let tickers = returns.tickers();
        let mut records = Vec::new();

        for (i, name_i) in tickers.iter().enumerate() {
            for (j, name_j) in tickers.iter().enumerate() {
                if name_i >= name_j {
                    continue;
                }
                let score = measure(returns.column_at(i), returns.column_at(j));
                if score.is_finite() {
                    records.push(PairCorrelationRecord {
                        ticker_a: name_i.clone(),
                        ticker_b: name_j.clone(),
                        score,
                        method,
                    });
                }
            }
        }
        records
    }

    /// Directional beta for every ordered pair of populated columns
    ///
    /// Undefined betas stay in the output (they sort last) so the record count
    /// is always `k * (k - 1)`.
    fn ols_betas(&self, returns: &ReturnsPanel) -> Vec<PairCorrelationRecord> {
        let columns = returns.populated_columns();
        let tickers = returns.tickers();

        let variances: Vec<f64> = columns
            .iter()
            .map(|&c| stats::variance(&stats::finite_values(returns.column_at(c))))
            .collect();

        let mut records = Vec::with_capacity(columns.len() * columns.len().saturating_sub(1));
        for (xi, &x) in columns.iter().enumerate() {
            for (yi, &y) in columns.iter().enumerate() {
                if xi == yi {
                    continue;
                }
                let cov_xy = stats::covariance_pairwise(returns.column_at(x), returns.column_at(y));
                let var_y = variances[yi];
                let beta = if var_y > stats::VARIANCE_EPSILON {
                    cov_xy / var_y
                } else {
                    f64::NAN
                };

                records.push(PairCorrelationRecord {
                    ticker_a: tickers[x].clone(),
                    ticker_b: tickers[y].clone(),
                    score: beta,
                    method: CorrelationMethod::Ols,
                });
            }
        }
        records
    }

    /// Kalman-denoised correlation, each unordered pair filtered exactly once
    fn kalman_scores(&self, returns: &ReturnsPanel) -> Vec<PairCorrelationRecord> {
        let pairs = triangular_pairs(returns.tickers().len());
        debug!(pairs = pairs.len(), parallel = self.parallel, "Running Kalman screen");

        map_pairs(&pairs, self.parallel, |i, j| self.kalman_pair(returns, i, j))
            .into_iter()
            .flatten()
            .collect()
    }

    fn kalman_pair(&self, returns: &ReturnsPanel, i: usize, j: usize) -> Option<PairCorrelationRecord> {
        let tickers = returns.tickers();
        // Orient lexicographically so the filter sees leg A in the first state slot
        let (a, b) = if tickers[i] < tickers[j] { (i, j) } else { (j, i) };

        let score = self.kalman.correlation(returns.column_at(a), returns.column_at(b));
        score.is_finite().then(|| PairCorrelationRecord {
            ticker_a: tickers[a].clone(),
            ticker_b: tickers[b].clone(),
            score,
            method: CorrelationMethod::Kalman,
        })
    }
}

/// Apply `score` once per pair, keeping the order of `pairs`
fn map_pairs<T, F>(pairs: &[(usize, usize)], parallel: bool, score: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize, usize) -> T + Sync,
{
    if parallel {
        pairs.par_iter().map(|&(i, j)| score(i, j)).collect()
    } else {
        pairs.iter().map(|&(i, j)| score(i, j)).collect()
    }
}

/// All `(i, j)` with `i < j < k`, in row-major order
pub fn triangular_pairs(k: usize) -> Vec<(usize, usize)> {
    (0..k)
        .flat_map(|i| ((i + 1)..k).map(move |j| (i, j)))
        .collect()
}

/// Stable sort by descending absolute score, undefined scores last
fn sort_by_abs_score(records: &mut [PairCorrelationRecord]) {
    records.sort_by(|a, b| {
        let (x, y) = (a.score.abs(), b.score.abs());
        match (x.is_nan(), y.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => y.total_cmp(&x),
        }
    });
}
