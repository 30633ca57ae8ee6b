//! Ornstein-Uhlenbeck Mean-Reversion Speed
//!
//! Estimates the mean-reversion speed of a pair's return spread from its
//! discrete AR(1) form:
//!
//! ```text
//! spread[t] = alpha + beta * spread[t-1] + e[t]
//! theta     = (1 - beta) / dt          (dt = 1 trading day)
//! ```
//!
//! theta > 0 indicates mean reversion, theta ~ 0 a random walk. When the
//! regression cannot be fit the estimator substitutes a fixed default speed
//! and flags the result as a fallback.

use tracing::{debug, warn};

use crate::domain::MeanReversionEstimate;

/// Speed reported when the regression is degenerate (per day)
pub const DEFAULT_FALLBACK_THETA: f64 = 0.5;
/// Daily sampling
const DAILY_DT: f64 = 1.0;
/// One residual degree of freedom beyond the two coefficients
const MIN_OBSERVATIONS: usize = 3;
/// Lagged-spread variance at or below this makes the design singular
const MIN_VARIANCE: f64 = 1e-18;

/// OLS-based OU speed estimator
#[derive(Debug, Clone)]
pub struct MeanReversionEstimator {
    fallback_theta: f64,
    dt: f64,
}

impl Default for MeanReversionEstimator {
    fn default() -> Self {
        Self {
            fallback_theta: DEFAULT_FALLBACK_THETA,
            dt: DAILY_DT,
        }
    }
}

impl MeanReversionEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback_theta(mut self, theta: f64) -> Self {
        self.fallback_theta = theta;
        self
    }

    pub fn fallback_theta(&self) -> f64 {
        self.fallback_theta
    }

    /// Estimate theta for the spread `returns_a - returns_b`
    pub fn estimate(&self, returns_a: &[f64], returns_b: &[f64]) -> MeanReversionEstimate {
        let spread: Vec<f64> = returns_a
            .iter()
            .zip(returns_b.iter())
            .map(|(a, b)| a - b)
            .collect();

        self.estimate_spread(&spread)
    }

    /// Estimate theta for an already-formed spread series
    pub fn estimate_spread(&self, spread: &[f64]) -> MeanReversionEstimate {
        let (lagged, current): (Vec<f64>, Vec<f64>) = spread
            .windows(2)
            .filter(|w| w[0].is_finite() && w[1].is_finite())
            .map(|w| (w[0], w[1]))
            .unzip();

        let n = lagged.len();
        match fit_ar1(&lagged, &current) {
            Some(fit) => {
                let theta = (1.0 - fit.beta) / self.dt;
                let half_life = if theta > 0.0 {
                    std::f64::consts::LN_2 / theta
                } else {
                    f64::NAN
                };

                debug!(observations = n, beta = fit.beta, theta, "Fitted spread AR(1)");

                MeanReversionEstimate {
                    theta,
                    is_fallback: false,
                    beta: fit.beta,
                    intercept: fit.intercept,
                    beta_t_stat: fit.beta_t_stat,
                    intercept_t_stat: fit.intercept_t_stat,
                    half_life,
                    observations: n,
                }
            }
            None => {
                warn!(
                    observations = n,
                    fallback_theta = self.fallback_theta,
                    "Spread regression is degenerate, using fallback mean-reversion speed"
                );
                MeanReversionEstimate::fallback(self.fallback_theta, n)
            }
        }
    }
}

/// Simple regression with intercept
#[derive(Debug, Clone, Copy)]
struct Ar1Fit {
    intercept: f64,
    beta: f64,
    intercept_t_stat: f64,
    beta_t_stat: f64,
}

fn fit_ar1(x: &[f64], y: &[f64]) -> Option<Ar1Fit> {
    let n = x.len();
    if n < MIN_OBSERVATIONS || y.len() != n {
        return None;
    }

    let nf = n as f64;
    let mean_x = x.iter().sum::<f64>() / nf;
    let mean_y = y.iter().sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        sxx += dx * dx;
        sxy += dx * (yi - mean_y);
    }

    if !(sxx / nf > MIN_VARIANCE) {
        return None;
    }

    let beta = sxy / sxx;
    let intercept = mean_y - beta * mean_x;
    if !beta.is_finite() || !intercept.is_finite() {
        return None;
    }

    let sse: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(xi, yi)| {
            let e = yi - intercept - beta * xi;
            e * e
        })
        .sum();
    let sigma2 = sse / (nf - 2.0);

    let se_beta = (sigma2 / sxx).sqrt();
    let se_intercept = (sigma2 * (1.0 / nf + mean_x * mean_x / sxx)).sqrt();

    Some(Ar1Fit {
        intercept,
        beta,
        intercept_t_stat: t_stat(intercept, se_intercept),
        beta_t_stat: t_stat(beta, se_beta),
    })
}

fn t_stat(coef: f64, se: f64) -> f64 {
    if se > 0.0 && se.is_finite() {
        coef / se
    } else {
        f64::NAN
    }
}
