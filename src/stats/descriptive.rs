//! Column-wise descriptive statistics.
//!
//! Central tendency, dispersion and shape of one channel's cleaned values.
//! Moments are computed in two passes over the data so results are exact
//! and repeatable for a given input order.

/// Central moments below this magnitude are treated as zero
const MOMENT_EPSILON: f64 = 1e-14;

/// Descriptive statistics of one non-empty set of values
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptive {
    pub n: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub q1: f64,
    pub q3: f64,
    pub max: f64,
    /// Sample standard deviation (ddof = 1); `None` below two values
    pub stdev: Option<f64>,
    /// Adjusted Fisher-Pearson skewness; `None` below three values
    pub skew: Option<f64>,
}

impl Descriptive {
    /// Compute statistics for `values`; `None` when empty
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mean = mean(values)?;

        Some(Self {
            n: values.len(),
            mean,
            median: quantile_sorted(&sorted, 0.5)?,
            min: sorted[0],
            q1: quantile_sorted(&sorted, crate::constants::Q1_FRACTION)?,
            q3: quantile_sorted(&sorted, crate::constants::Q3_FRACTION)?,
            max: sorted[sorted.len() - 1],
            stdev: sample_std(values, mean),
            skew: skewness(values, mean),
        })
    }
}

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Quantile of ascending `sorted` values with linear interpolation
/// between the two nearest order statistics.
pub fn quantile_sorted(sorted: &[f64], fraction: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&fraction) {
        return None;
    }

    let position = (sorted.len() - 1) as f64 * fraction;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Sample standard deviation around a known mean
pub fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Adjusted Fisher-Pearson sample skewness around a known mean
pub fn skewness(values: &[f64], mean: f64) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }

    let mut sum_sq = 0.0;
    let mut sum_cube = 0.0;
    for value in values {
        let d = value - mean;
        sum_sq += d * d;
        sum_cube += d * d * d;
    }

    if sum_sq.abs() < MOMENT_EPSILON {
        return Some(0.0);
    }
    if sum_cube.abs() < MOMENT_EPSILON {
        sum_cube = 0.0;
    }

    let n = n as f64;
    Some((n * (n - 1.0).sqrt() / (n - 2.0)) * (sum_cube / sum_sq.powf(1.5)))
}
