//! Descriptive statistics over score sequences
//!
//! Everything here is a pure function over a slice; summaries are recomputed
//! on demand and never cached or persisted.

use evalkit_core::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Full descriptive summary of a score sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptiveStats {
    /// Number of observations
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Median; mean of the two middle elements on even counts
    pub median: f64,
    /// All values sharing the maximum observed frequency (multimodal)
    pub mode: Vec<f64>,
    /// Population variance (divides by N)
    pub variance: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Smallest observation
    pub min: f64,
    /// Largest observation
    pub max: f64,
    /// max - min
    pub range: f64,
    /// First, second and third quartiles
    pub quartiles: Quartiles,
    /// Bias-adjusted sample skewness; 0.0 below three observations
    pub skewness: f64,
    /// Bias-adjusted excess kurtosis; 0.0 below four observations
    pub kurtosis: f64,
}

/// Quartile cut points, computed by linear-interpolation percentile
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Quartiles {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

/// Approximate confidence interval for a mean
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
    pub confidence_level: f64,
}

/// Compute the full descriptive summary. Fails on an empty input.
pub fn describe(values: &[f64]) -> Result<DescriptiveStats> {
    if values.is_empty() {
        return Err(EvalError::InsufficientData(
            "descriptive statistics require at least one value".to_string(),
        ));
    }

    let n = values.len();
    let mean = mean(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    let std_dev = variance.sqrt();

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let min = sorted[0];
    let max = sorted[n - 1];

    Ok(DescriptiveStats {
        count: n,
        mean,
        median: percentile_sorted(&sorted, 50.0),
        mode: mode(values),
        variance,
        std_dev,
        min,
        max,
        range: max - min,
        quartiles: Quartiles {
            q1: percentile_sorted(&sorted, 25.0),
            q2: percentile_sorted(&sorted, 50.0),
            q3: percentile_sorted(&sorted, 75.0),
        },
        skewness: sample_skewness(values, mean),
        kurtosis: excess_kurtosis(values, mean),
    })
}

/// Arithmetic mean; 0.0 on an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by N); 0.0 on an empty slice
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Arbitrary percentile by linear interpolation between closest ranks.
///
/// The interpolation index is `p / 100 * (n - 1)`, so `percentile(v, 50)`
/// equals the median. Fails on an empty input.
pub fn percentile(values: &[f64], p: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(EvalError::InsufficientData(
            "percentile requires at least one value".to_string(),
        ));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Ok(percentile_sorted(&sorted, p))
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let p = p.clamp(0.0, 100.0);
    let idx = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (idx - lo as f64) * (sorted[hi] - sorted[lo])
    }
}

/// All values sharing the maximum observed frequency.
///
/// Values are compared by exact bit pattern; scores that repeat do so
/// exactly in practice. The result is sorted ascending for determinism.
fn mode(values: &[f64]) -> Vec<f64> {
    let mut counts: HashMap<u64, (f64, usize)> = HashMap::new();
    for &v in values {
        counts.entry(v.to_bits()).or_insert((v, 0)).1 += 1;
    }
    let max_count = counts.values().map(|(_, c)| *c).max().unwrap_or(0);
    let mut modes: Vec<f64> = counts
        .into_values()
        .filter(|(_, c)| *c == max_count)
        .map(|(v, _)| v)
        .collect();
    modes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    modes
}

/// Bias-adjusted sample skewness: `n / ((n-1)(n-2)) * Σ((x - x̄)/s)³`
/// with `s` the sample standard deviation. 0.0 when the correction is
/// undefined (n < 3) or the data has no spread.
fn sample_skewness(values: &[f64], mean: f64) -> f64 {
    let n = values.len();
    if n < 3 {
        return 0.0;
    }
    let nf = n as f64;
    let sample_var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (nf - 1.0);
    let s = sample_var.sqrt();
    if s == 0.0 {
        return 0.0;
    }
    let m3: f64 = values.iter().map(|v| ((v - mean) / s).powi(3)).sum();
    nf / ((nf - 1.0) * (nf - 2.0)) * m3
}

/// Bias-adjusted excess kurtosis:
/// `n(n+1) / ((n-1)(n-2)(n-3)) * Σ((x - x̄)/s)⁴ - 3(n-1)² / ((n-2)(n-3))`.
/// 0.0 when the correction is undefined (n < 4) or the data has no spread.
fn excess_kurtosis(values: &[f64], mean: f64) -> f64 {
    let n = values.len();
    if n < 4 {
        return 0.0;
    }
    let nf = n as f64;
    let sample_var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (nf - 1.0);
    let s = sample_var.sqrt();
    if s == 0.0 {
        return 0.0;
    }
    let m4: f64 = values.iter().map(|v| ((v - mean) / s).powi(4)).sum();
    nf * (nf + 1.0) / ((nf - 1.0) * (nf - 2.0) * (nf - 3.0)) * m4
        - 3.0 * (nf - 1.0).powi(2) / ((nf - 2.0) * (nf - 3.0))
}

/// 95% confidence interval for the mean: `mean ± t · (σ/√n)`.
///
/// Critical values come from a coarse degrees-of-freedom bucket table rather
/// than a true inverse Student-t, so intervals are approximate by design.
pub fn confidence_interval(values: &[f64]) -> Result<ConfidenceInterval> {
    if values.is_empty() {
        return Err(EvalError::InsufficientData(
            "confidence interval requires at least one value".to_string(),
        ));
    }
    let n = values.len() as f64;
    let m = mean(values);
    let margin = t_critical(values.len().saturating_sub(1)) * population_std_dev(values) / n.sqrt();
    Ok(ConfidenceInterval {
        mean: m,
        lower: m - margin,
        upper: m + margin,
        confidence_level: 0.95,
    })
}

// Coarse 95% two-tailed critical values by degrees-of-freedom bucket.
fn t_critical(df: usize) -> f64 {
    match df {
        d if d >= 30 => 1.96,
        d if d >= 20 => 2.086,
        d if d >= 10 => 2.228,
        _ => 2.571,
    }
}

/// Indices of values whose |z-score| exceeds `z_threshold`.
///
/// Fewer than three values, or a spread of zero, yields no outliers.
pub fn detect_outliers(values: &[f64], z_threshold: f64) -> Vec<usize> {
    if values.len() < 3 {
        return Vec::new();
    }
    let m = mean(values);
    let sd = population_std_dev(values);
    if sd == 0.0 {
        return Vec::new();
    }
    values
        .iter()
        .enumerate()
        .filter(|&(_, &v)| ((v - m).abs() / sd) > z_threshold)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_empty_fails() {
        let err = describe(&[]).unwrap_err();
        assert!(matches!(err, EvalError::InsufficientData(_)));
    }

    #[test]
    fn test_population_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = describe(&values).unwrap();
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
        assert!((stats.variance - 4.0).abs() < 1e-12);
        assert!((stats.mean - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(describe(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap().median, 3.0);
        assert_eq!(describe(&[1.0, 2.0, 3.0, 4.0]).unwrap().median, 2.5);
    }

    #[test]
    fn test_percentile_interpolation() {
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0, 5.0], 50.0).unwrap(), 3.0);
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0], 50.0).unwrap(), 2.5);
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.0).unwrap(), 1.0);
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0, 5.0], 100.0).unwrap(), 5.0);
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0, 5.0], 25.0).unwrap(), 2.0);
    }

    #[test]
    fn test_mode_is_multimodal() {
        let stats = describe(&[1.0, 2.0, 2.0, 3.0, 3.0]).unwrap();
        assert_eq!(stats.mode, vec![2.0, 3.0]);

        let stats = describe(&[1.0, 1.0, 2.0]).unwrap();
        assert_eq!(stats.mode, vec![1.0]);
    }

    #[test]
    fn test_quartiles() {
        let stats = describe(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(stats.quartiles.q1, 2.0);
        assert_eq!(stats.quartiles.q2, 3.0);
        assert_eq!(stats.quartiles.q3, 4.0);
    }

    #[test]
    fn test_skewness_sign() {
        // Right-skewed data has positive skewness
        let right = describe(&[1.0, 1.0, 1.0, 2.0, 10.0]).unwrap();
        assert!(right.skewness > 0.0);

        // Symmetric data is close to zero
        let sym = describe(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!(sym.skewness.abs() < 1e-9);
    }

    #[test]
    fn test_small_samples_zero_higher_moments() {
        let stats = describe(&[1.0, 2.0]).unwrap();
        assert_eq!(stats.skewness, 0.0);
        assert_eq!(stats.kurtosis, 0.0);
    }

    #[test]
    fn test_confidence_interval_brackets_mean() {
        let values: Vec<f64> = (1..=50).map(|i| i as f64 / 50.0).collect();
        let ci = confidence_interval(&values).unwrap();
        assert!(ci.lower < ci.mean && ci.mean < ci.upper);
        assert_eq!(ci.confidence_level, 0.95);
    }

    #[test]
    fn test_t_critical_buckets() {
        assert_eq!(t_critical(40), 1.96);
        assert_eq!(t_critical(25), 2.086);
        assert_eq!(t_critical(12), 2.228);
        assert_eq!(t_critical(4), 2.571);
    }

    #[test]
    fn test_detect_outliers() {
        let values = [1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 100.0];
        let outliers = detect_outliers(&values, 2.0);
        assert_eq!(outliers, vec![7]);

        assert!(detect_outliers(&[1.0, 2.0], 2.0).is_empty());
        assert!(detect_outliers(&[3.0, 3.0, 3.0, 3.0], 2.0).is_empty());
    }
}
