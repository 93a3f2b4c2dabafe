//! Classification-style performance metrics
//!
//! Continuous scores are thresholded into binary predictions and compared
//! against each result's own `passed` flag as ground truth.

use evalkit_core::{EvalError, EvalResult, Result};
use serde::{Deserialize, Serialize};

/// Score threshold for a predicted-positive when none is supplied
pub const DEFAULT_PREDICTION_THRESHOLD: f64 = 0.7;

/// 2x2 confusion matrix
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

/// Metrics derived from the confusion matrix.
///
/// Any metric whose denominator is zero is defined as 0.0, never NaN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub confusion: ConfusionMatrix,
    pub accuracy: f64,
    pub precision: f64,
    /// Recall, a.k.a. sensitivity
    pub recall: f64,
    pub f1: f64,
    pub specificity: f64,
    /// Matthews correlation coefficient
    pub mcc: f64,
}

/// Build the confusion matrix and derive its metrics.
///
/// Predicted-positive iff `score >= threshold` (default 0.7);
/// actual-positive iff the result's `passed` flag is set.
pub fn performance_metrics(
    results: &[EvalResult],
    threshold: Option<f64>,
) -> Result<PerformanceMetrics> {
    if results.is_empty() {
        return Err(EvalError::InsufficientData(
            "performance metrics require at least one result".to_string(),
        ));
    }
    let threshold = threshold.unwrap_or(DEFAULT_PREDICTION_THRESHOLD);

    let mut confusion = ConfusionMatrix::default();
    for result in results {
        let predicted = result.score >= threshold;
        match (predicted, result.passed) {
            (true, true) => confusion.true_positives += 1,
            (true, false) => confusion.false_positives += 1,
            (false, false) => confusion.true_negatives += 1,
            (false, true) => confusion.false_negatives += 1,
        }
    }

    let tp = confusion.true_positives as f64;
    let fp = confusion.false_positives as f64;
    let tn = confusion.true_negatives as f64;
    let fn_ = confusion.false_negatives as f64;

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);

    Ok(PerformanceMetrics {
        confusion,
        accuracy: ratio(tp + tn, tp + fp + tn + fn_),
        precision,
        recall,
        f1: ratio(2.0 * precision * recall, precision + recall),
        specificity: ratio(tn, tn + fp),
        mcc: matthews(tp, fp, tn, fn_),
    })
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 { 0.0 } else { numerator / denominator }
}

fn matthews(tp: f64, fp: f64, tn: f64, fn_: f64) -> f64 {
    let denominator = ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt();
    ratio(tp * tn - fp * fn_, denominator)
}
