//! Descriptive statistics over `f64` series
//!
//! Thin wrappers over `statrs` that follow one convention: undefined results
//! are `NaN`, never panics. Sample (n - 1) estimators throughout.

use statrs::statistics::{Data, OrderStatistics, RankTieBreaker, Statistics};

/// Variance below this is treated as zero
pub const VARIANCE_EPSILON: f64 = 1e-18;

/// Rows where both series hold a finite value
pub fn paired_finite(a: &[f64], b: &[f64]) -> (Vec<f64>, Vec<f64>) {
    a.iter()
        .zip(b.iter())
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| (*x, *y))
        .unzip()
}

/// Finite values of a series
pub fn finite_values(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().mean()
}

/// Sample variance, NaN for fewer than 2 values
pub fn variance(values: &[f64]) -> f64 {
    values.iter().variance()
}

/// Sample standard deviation, NaN for fewer than 2 values
pub fn std_dev(values: &[f64]) -> f64 {
    values.iter().std_dev()
}

/// Sample covariance of two equal-length series
pub fn covariance(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return f64::NAN;
    }
    a.iter().covariance(b.iter())
}

/// Pearson correlation of two equal-length, fully defined series
///
/// NaN with fewer than 2 observations or a zero-variance input.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return f64::NAN;
    }

    let var_a = variance(a);
    let var_b = variance(b);
    if !(var_a > VARIANCE_EPSILON && var_b > VARIANCE_EPSILON) {
        return f64::NAN;
    }

    let r = covariance(a, b) / (var_a.sqrt() * var_b.sqrt());
    if r.is_finite() {
        r.clamp(-1.0, 1.0)
    } else {
        f64::NAN
    }
}

/// Pearson correlation over pairwise-complete observations
pub fn pearson_pairwise(a: &[f64], b: &[f64]) -> f64 {
    let (x, y) = paired_finite(a, b);
    pearson(&x, &y)
}

/// Average ranks (1-based); ties share the mean of their positions
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut data = Data::new(values.to_vec());
    data.ranks(RankTieBreaker::Average)
}

/// Spearman rank correlation over pairwise-complete observations
pub fn spearman_pairwise(a: &[f64], b: &[f64]) -> f64 {
    let (x, y) = paired_finite(a, b);
    if x.len() < 2 {
        return f64::NAN;
    }
    pearson(&average_ranks(&x), &average_ranks(&y))
}

/// Sample covariance over pairwise-complete observations
pub fn covariance_pairwise(a: &[f64], b: &[f64]) -> f64 {
    let (x, y) = paired_finite(a, b);
    covariance(&x, &y)
}

/// Trailing rolling mean and sample std over `window` values
///
/// Entries before the window fills, or whose window holds a non-finite
/// value, are NaN.
pub fn rolling_mean_std(values: &[f64], window: usize) -> (Vec<f64>, Vec<f64>) {
    let mut means = vec![f64::NAN; values.len()];
    let mut stds = vec![f64::NAN; values.len()];
    if window == 0 || values.len() < window {
        return (means, stds);
    }

    for end in window..=values.len() {
        let slice = &values[end - window..end];
        if slice.iter().all(|v| v.is_finite()) {
            means[end - 1] = mean(slice);
            stds[end - 1] = std_dev(slice);
        }
    }
    (means, stds)
}

/// Trailing rolling Pearson correlation over `window` rows
pub fn rolling_correlation(a: &[f64], b: &[f64], window: usize) -> Vec<f64> {
    let n = a.len().min(b.len());
    let mut out = vec![f64::NAN; n];
    if window < 2 || n < window {
        return out;
    }

    for end in window..=n {
        let xa = &a[end - window..end];
        let xb = &b[end - window..end];
        if xa.iter().chain(xb.iter()).all(|v| v.is_finite()) {
            out[end - 1] = pearson(xa, xb);
        }
    }
    out
}
