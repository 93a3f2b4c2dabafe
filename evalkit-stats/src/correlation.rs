//! Pearson correlation across metrics extracted from results

use crate::descriptive::mean;
use evalkit_core::{DetailValue, EvalError, EvalResult, Result};
use serde::{Deserialize, Serialize};

/// Off-diagonal coefficients beyond this magnitude are flagged significant
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.3;

/// Qualitative correlation strength by coefficient magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl CorrelationStrength {
    /// Classify a coefficient by |r| at the 0.4 / 0.6 / 0.8 cut points
    pub fn from_coefficient(r: f64) -> Self {
        match r.abs() {
            a if a < 0.4 => CorrelationStrength::Weak,
            a if a < 0.6 => CorrelationStrength::Moderate,
            a if a < 0.8 => CorrelationStrength::Strong,
            _ => CorrelationStrength::VeryStrong,
        }
    }
}

/// A flagged off-diagonal metric pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignificantCorrelation {
    pub metric_a: String,
    pub metric_b: String,
    pub coefficient: f64,
    pub strength: CorrelationStrength,
}

/// Full Pearson correlation matrix over named metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// Metric names, matching matrix row/column order
    pub metrics: Vec<String>,
    /// Row-major coefficients; the diagonal is 1.0
    pub matrix: Vec<Vec<f64>>,
    /// Off-diagonal pairs with |r| above [`SIGNIFICANCE_THRESHOLD`]
    pub significant: Vec<SignificantCorrelation>,
}

/// Compute the Pearson correlation matrix for the given metric names.
///
/// Each metric's per-subject value comes from the result's `details`
/// (numeric entries only); results without that entry fall back to their
/// overall score.
pub fn correlation_matrix(
    results: &[EvalResult],
    metrics: &[String],
) -> Result<CorrelationMatrix> {
    if results.is_empty() {
        return Err(EvalError::InsufficientData(
            "correlation requires at least one result".to_string(),
        ));
    }
    if metrics.is_empty() {
        return Err(EvalError::InsufficientData(
            "correlation requires at least one metric name".to_string(),
        ));
    }

    let series: Vec<Vec<f64>> = metrics
        .iter()
        .map(|metric| {
            results
                .iter()
                .map(|r| {
                    r.details
                        .get(metric)
                        .and_then(DetailValue::as_number)
                        .unwrap_or(r.score)
                })
                .collect()
        })
        .collect();

    let k = metrics.len();
    let mut matrix = vec![vec![0.0; k]; k];
    let mut significant = Vec::new();

    for i in 0..k {
        matrix[i][i] = 1.0;
        for j in (i + 1)..k {
            let r = pearson(&series[i], &series[j]);
            matrix[i][j] = r;
            matrix[j][i] = r;
            if r.abs() > SIGNIFICANCE_THRESHOLD {
                significant.push(SignificantCorrelation {
                    metric_a: metrics[i].clone(),
                    metric_b: metrics[j].clone(),
                    coefficient: r,
                    strength: CorrelationStrength::from_coefficient(r),
                });
            }
        }
    }

    Ok(CorrelationMatrix { metrics: metrics.to_vec(), matrix, significant })
}

/// Pearson correlation coefficient of two equally long series.
///
/// Mismatched lengths or zero variance in either series yield 0.0.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return 0.0;
    }
    let mx = mean(x);
    let my = mean(y);
    let covariance: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    let sx: f64 = x.iter().map(|a| (a - mx).powi(2)).sum::<f64>().sqrt();
    let sy: f64 = y.iter().map(|b| (b - my).powi(2)).sum::<f64>().sqrt();
    if sx == 0.0 || sy == 0.0 {
        return 0.0;
    }
    covariance / (sx * sy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalkit_core::EvalResult;

    fn result_with(score: f64, details: &[(&str, f64)]) -> EvalResult {
        let mut r = EvalResult::graded(score, None);
        for (k, v) in details {
            r = r.with_detail(*k, *v);
        }
        r
    }

    #[test]
    fn test_pearson_perfect_correlation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);

        let inverse = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&x, &inverse) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_zero_variance() {
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_matrix_diagonal_and_symmetry() {
        let results = vec![
            result_with(0.2, &[("latency", 10.0)]),
            result_with(0.5, &[("latency", 20.0)]),
            result_with(0.9, &[("latency", 30.0)]),
        ];
        let metrics = vec!["score_proxy".to_string(), "latency".to_string()];
        let cm = correlation_matrix(&results, &metrics).unwrap();

        assert_eq!(cm.matrix[0][0], 1.0);
        assert_eq!(cm.matrix[1][1], 1.0);
        assert_eq!(cm.matrix[0][1], cm.matrix[1][0]);
        // Scores and latency both increase monotonically here
        assert!(cm.matrix[0][1] > 0.9);
        assert_eq!(cm.significant.len(), 1);
        assert_eq!(cm.significant[0].strength, CorrelationStrength::VeryStrong);
    }

    #[test]
    fn test_detail_fallback_to_score() {
        // "missing" is not in details, so the series is the scores themselves
        let results = vec![
            result_with(0.1, &[]),
            result_with(0.5, &[]),
            result_with(0.9, &[]),
        ];
        let metrics = vec!["missing".to_string(), "also_missing".to_string()];
        let cm = correlation_matrix(&results, &metrics).unwrap();
        // Identical series correlate perfectly
        assert!((cm.matrix[0][1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_inputs_fail() {
        assert!(correlation_matrix(&[], &["a".to_string()]).is_err());
        let results = vec![result_with(0.5, &[])];
        assert!(correlation_matrix(&results, &[]).is_err());
    }
}
