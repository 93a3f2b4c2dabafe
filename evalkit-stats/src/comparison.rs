//! Baseline vs. treatment comparison of score sets

use crate::descriptive::mean;
use evalkit_core::{EvalError, Result};
use serde::{Deserialize, Serialize};

/// |t| beyond this counts as significant (normal-tail approximation)
pub const SIGNIFICANCE_T: f64 = 1.96;

/// Outcome of comparing a treatment score set against a baseline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub baseline_mean: f64,
    pub treatment_mean: f64,
    /// Relative change of the treatment mean over the baseline mean
    pub improvement: f64,
    /// Cohen's d, using the pooled standard deviation
    pub effect_size: f64,
    /// Pooled-variance two-sample t statistic
    pub t_statistic: f64,
    /// |t| > 1.96; approximate, not a full inverse-t test
    pub significant: bool,
    /// Qualitative effect size, e.g. "medium (improvement)"
    pub effect_label: String,
}

/// Compare two score sets. Fails when either set is empty.
pub fn compare(baseline: &[f64], treatment: &[f64]) -> Result<ComparisonReport> {
    if baseline.is_empty() || treatment.is_empty() {
        return Err(EvalError::InsufficientData(
            "comparison requires non-empty baseline and treatment sets".to_string(),
        ));
    }

    let baseline_mean = mean(baseline);
    let treatment_mean = mean(treatment);

    let improvement = if baseline_mean == 0.0 {
        0.0
    } else {
        (treatment_mean - baseline_mean) / baseline_mean.abs()
    };

    let pooled = pooled_std_dev(baseline, treatment);
    let effect_size =
        if pooled == 0.0 { 0.0 } else { (treatment_mean - baseline_mean) / pooled };

    let n1 = baseline.len() as f64;
    let n2 = treatment.len() as f64;
    let t_statistic = if pooled == 0.0 {
        0.0
    } else {
        (treatment_mean - baseline_mean) / (pooled * (1.0 / n1 + 1.0 / n2).sqrt())
    };

    Ok(ComparisonReport {
        baseline_mean,
        treatment_mean,
        improvement,
        effect_size,
        t_statistic,
        significant: t_statistic.abs() > SIGNIFICANCE_T,
        effect_label: effect_label(effect_size),
    })
}

/// Pooled standard deviation over the two samples' unbiased variances
fn pooled_std_dev(a: &[f64], b: &[f64]) -> f64 {
    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    if n1 + n2 <= 2.0 {
        return 0.0;
    }
    let v1 = sample_variance(a);
    let v2 = sample_variance(b);
    (((n1 - 1.0) * v1 + (n2 - 1.0) * v2) / (n1 + n2 - 2.0)).sqrt()
}

/// Unbiased sample variance (divides by n - 1); 0.0 below two values
fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

fn effect_label(d: f64) -> String {
    let magnitude = match d.abs() {
        a if a < 0.2 => "negligible",
        a if a < 0.5 => "small",
        a if a < 0.8 => "medium",
        _ => "large",
    };
    let direction = if d < 0.0 { "degradation" } else { "improvement" };
    format!("{} ({})", magnitude, direction)
}
