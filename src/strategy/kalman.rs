//! Kalman Co-Movement Estimator
//!
//! Denoises a pair of aligned return series with a two-dimensional linear
//! state-space filter, then scores co-movement as the Pearson correlation of
//! the filtered output instead of the raw returns.
//!
//! # Model
//!
//! ```text
//! x[t] = A x[t-1] + w,   w ~ N(0, Q)      (A = identity by default: no drift)
//! z[t] = x[t] + v,       v ~ N(0, R)      (observation matrix fixed to identity)
//! ```
//!
//! The state starts at the first observed pair of returns. Only the forward
//! pass runs: each output uses observations up to and including its own step.

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use super::stats;

/// Row-major 2x2 matrix as written in the config file
pub type MatrixRows = [[f64; 2]; 2];

const IDENTITY_ROWS: MatrixRows = [[1.0, 0.0], [0.0, 1.0]];

/// Filter parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KalmanConfig {
    /// Diagonal of the observation-noise covariance R
    pub observation_noise: [f64; 2],
    /// Diagonal of the transition-noise covariance Q
    pub transition_noise: [f64; 2],
    /// Diagonal of the initial state covariance P0
    pub initial_covariance: [f64; 2],
    /// State transition matrix A
    pub transition_matrix: MatrixRows,
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            observation_noise: [0.1, 0.1],
            transition_noise: [1.0, 1.0],
            initial_covariance: [1.0, 1.0],
            transition_matrix: IDENTITY_ROWS,
        }
    }
}

impl KalmanConfig {
    pub fn with_observation_noise(mut self, noise: [f64; 2]) -> Self {
        self.observation_noise = noise;
        self
    }

    pub fn with_transition_matrix(mut self, matrix: MatrixRows) -> Self {
        self.transition_matrix = matrix;
        self
    }

    /// Covariance diagonals must be finite and non-negative
    pub fn validate(&self) -> Result<(), String> {
        let diagonals = [
            ("observation_noise", self.observation_noise),
            ("transition_noise", self.transition_noise),
            ("initial_covariance", self.initial_covariance),
        ];
        for (name, diag) in diagonals {
            if diag.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(format!("{} must be finite and >= 0, got {:?}", name, diag));
            }
        }
        if self.transition_matrix.iter().flatten().any(|v| !v.is_finite()) {
            return Err(format!(
                "transition_matrix must be finite, got {:?}",
                self.transition_matrix
            ));
        }
        Ok(())
    }
}

/// Forward Kalman filter over a pair of return series
#[derive(Debug, Clone, Default)]
pub struct KalmanCoMovementEstimator {
    config: KalmanConfig,
}

impl KalmanCoMovementEstimator {
    pub fn new(config: KalmanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KalmanConfig {
        &self.config
    }

    /// Filtered state means for the rows where both inputs are defined
    ///
    /// Returns `None` when no row is jointly defined or the innovation
    /// covariance becomes singular.
    pub fn filter(&self, a: &[f64], b: &[f64]) -> Option<Vec<[f64; 2]>> {
        let (xa, xb) = stats::paired_finite(a, b);

        let transition = rows_to_matrix(&self.config.transition_matrix);
        let q = diagonal(self.config.transition_noise);
        let r = diagonal(self.config.observation_noise);

        let mut state = Vector2::new(*xa.first()?, *xb.first()?);
        let mut cov = diagonal(self.config.initial_covariance);
        let mut out = Vec::with_capacity(xa.len());

        for (t, (za, zb)) in xa.iter().zip(xb.iter()).enumerate() {
            if t > 0 {
                state = transition * state;
                cov = transition * cov * transition.transpose() + q;
            }

            let gain = cov * (cov + r).try_inverse()?;
            state += gain * (Vector2::new(*za, *zb) - state);
            cov = (Matrix2::<f64>::identity() - gain) * cov;

            out.push([state[0], state[1]]);
        }

        Some(out)
    }

    /// Pearson correlation of the filtered series, NaN when undefined
    pub fn correlation(&self, a: &[f64], b: &[f64]) -> f64 {
        match self.filter(a, b) {
            Some(states) if states.len() >= 2 => {
                let (fa, fb): (Vec<f64>, Vec<f64>) = states.iter().map(|s| (s[0], s[1])).unzip();
                stats::pearson(&fa, &fb)
            }
            _ => f64::NAN,
        }
    }
}

fn diagonal(d: [f64; 2]) -> Matrix2<f64> {
    Matrix2::from_diagonal(&Vector2::new(d[0], d[1]))
}

fn rows_to_matrix(rows: &MatrixRows) -> Matrix2<f64> {
    Matrix2::new(rows[0][0], rows[0][1], rows[1][0], rows[1][1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_step_keeps_initial_state() {
        // State starts at the first observation, so the first update is a no-op
        let est = KalmanCoMovementEstimator::default();
        let states = est.filter(&[0.01, 0.03], &[0.02, -0.01]).unwrap();
        assert_relative_eq!(states[0][0], 0.01, epsilon = 1e-15);
        assert_relative_eq!(states[0][1], 0.02, epsilon = 1e-15);
    }

    #[test]
    fn test_second_step_gain_matches_closed_form() {
        // P0 = 1, after first update P = 1 * 0.1 / 1.1; predict adds Q = 1
        let est = KalmanCoMovementEstimator::default();
        let states = est.filter(&[0.0, 1.0], &[0.0, 0.0]).unwrap();

        let p1 = 0.1 / 1.1;
        let p_pred = p1 + 1.0;
        let gain = p_pred / (p_pred + 0.1);
        assert_relative_eq!(states[1][0], gain, epsilon = 1e-12);
        assert_relative_eq!(states[1][1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_transition_matrix_is_row_major() {
        // A = [[0, 1], [0, 1]] moves the second state into the first slot
        let est = KalmanCoMovementEstimator::new(
            KalmanConfig::default().with_transition_matrix([[0.0, 1.0], [0.0, 1.0]]),
        );
        let states = est.filter(&[0.0, 1.0], &[1.0, 1.0]).unwrap();
        assert_relative_eq!(states[1][0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(states[1][1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_filter_output_is_smoother_than_input() {
        let a: Vec<f64> = (0..50).map(|i| if i % 2 == 0 { 0.02 } else { -0.02 }).collect();
        let b: Vec<f64> = a.iter().map(|v| v * 0.5).collect();
        let est = KalmanCoMovementEstimator::new(
            KalmanConfig::default().with_observation_noise([10.0, 10.0]),
        );
        let states = est.filter(&a, &b).unwrap();
        let max_abs = states.iter().skip(1).map(|s| s[0].abs()).fold(0.0, f64::max);
        assert!(max_abs < 0.02);
    }

    #[test]
    fn test_missing_rows_dropped() {
        let est = KalmanCoMovementEstimator::default();
        let states = est
            .filter(&[f64::NAN, 0.01, 0.02, 0.03], &[0.5, 0.01, f64::NAN, 0.02])
            .unwrap();
        assert_eq!(states.len(), 2);
        assert_relative_eq!(states[0][0], 0.01, epsilon = 1e-15);
    }

    #[test]
    fn test_correlation_of_co_moving_series() {
        let a: Vec<f64> = (0..60).map(|i| ((i as f64) * 0.7).sin() * 0.02).collect();
        let b: Vec<f64> = a.iter().map(|v| v * 1.5 + 0.001).collect();
        let est = KalmanCoMovementEstimator::default();
        let corr = est.correlation(&a, &b);
        assert!(corr > 0.99, "corr = {}", corr);
    }

    #[test]
    fn test_correlation_undefined_for_short_input() {
        let est = KalmanCoMovementEstimator::default();
        assert!(est.correlation(&[0.01], &[0.02]).is_nan());
        assert!(est.correlation(&[], &[]).is_nan());
    }

    #[test]
    fn test_singular_innovation_returns_none() {
        let config = KalmanConfig {
            observation_noise: [0.0, 0.0],
            transition_noise: [0.0, 0.0],
            initial_covariance: [0.0, 0.0],
            ..Default::default()
        };
        let est = KalmanCoMovementEstimator::new(config);
        assert!(est.filter(&[0.1, 0.2], &[0.1, 0.2]).is_none());
    }

    #[test]
    fn test_config_validation() {
        assert!(KalmanConfig::default().validate().is_ok());
        let bad = KalmanConfig::default().with_observation_noise([-1.0, 0.1]);
        assert!(bad.validate().is_err());
        let nan = KalmanConfig::default().with_transition_matrix([[f64::NAN, 0.0], [0.0, 1.0]]);
        assert!(nan.validate().is_err());
    }
}
