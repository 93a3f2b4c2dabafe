//! Evaluation results and per-subject reports

use crate::criteria::EvalConfig;
use crate::subject::DetailValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pass threshold applied when a result is graded without an explicit one
pub const DEFAULT_RESULT_THRESHOLD: f64 = 0.5;

/// Outcome of scoring one criterion, or of one aggregated subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalResult {
    /// Score in [0.0, 1.0]; out-of-range inputs are clamped at construction
    pub score: f64,

    /// Whether the score met its threshold
    pub passed: bool,

    /// Why the score is what it is; recovered errors surface here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,

    /// Diagnostic details for downstream analysis
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, DetailValue>,

    /// When the result was produced
    pub timestamp: DateTime<Utc>,
}

impl EvalResult {
    /// Build a result from a raw score, clamping into [0.0, 1.0] and deriving
    /// `passed` from the threshold (0.5 when none is given).
    pub fn graded(score: f64, threshold: Option<f64>) -> Self {
        let score = clamp_unit(score);
        Self {
            score,
            passed: score >= threshold.unwrap_or(DEFAULT_RESULT_THRESHOLD),
            feedback: None,
            details: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Zero-score failure carrying the reason in `feedback`
    pub fn failure(feedback: impl Into<String>) -> Self {
        Self {
            score: 0.0,
            passed: false,
            feedback: Some(feedback.into()),
            details: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attach feedback
    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }

    /// Attach one detail entry
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<DetailValue>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Clamp a score into [0.0, 1.0]; NaN maps to 0.0
pub(crate) fn clamp_unit(score: f64) -> f64 {
    if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) }
}

/// A criterion's result paired with the criterion name it came from.
///
/// Reports keep these in declaration order regardless of the order in which
/// scoring futures complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionResult {
    /// Name of the criterion that produced this result
    pub criterion: String,
    /// The result itself
    pub result: EvalResult,
}

/// Identity and configuration snapshot of the evaluator that produced a report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatorInfo {
    /// Evaluator name
    pub name: String,
    /// Evaluator version
    pub version: String,
    /// Configuration at the time of evaluation (custom aggregators are not
    /// serialized)
    pub config: EvalConfig,
}

/// Full per-subject evaluation outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    /// Aggregated score in [0.0, 1.0]
    pub overall_score: f64,

    /// Overall threshold met and every required criterion passed
    pub passed: bool,

    /// Per-criterion results, declaration order
    pub criteria_results: Vec<CriterionResult>,

    /// One-line outcome summary
    pub summary: String,

    /// One line per failed criterion that carried feedback, declaration order
    pub recommendations: Vec<String>,

    /// When the report was produced
    pub timestamp: DateTime<Utc>,

    /// Who produced it, and with what configuration
    pub evaluator: EvaluatorInfo,
}

impl EvalReport {
    /// Look up one criterion's result by name
    pub fn criterion(&self, name: &str) -> Option<&EvalResult> {
        self.criteria_results.iter().find(|c| c.criterion == name).map(|c| &c.result)
    }

    /// Number of criteria whose individual result passed
    pub fn passed_count(&self) -> usize {
        self.criteria_results.iter().filter(|c| c.result.passed).count()
    }

    /// Format as a human-readable string
    pub fn format(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("{}\n", self.summary));
        output.push_str(&format!(
            "Evaluator: {} v{}\n",
            self.evaluator.name, self.evaluator.version
        ));
        for entry in &self.criteria_results {
            output.push_str(&format!(
                "  {}: {:.3} ({})\n",
                entry.criterion,
                entry.result.score,
                if entry.result.passed { "pass" } else { "fail" }
            ));
        }
        if !self.recommendations.is_empty() {
            output.push_str("Recommendations:\n");
            for rec in &self.recommendations {
                output.push_str(&format!("  - {}\n", rec));
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graded_clamps_score() {
        assert_eq!(EvalResult::graded(1.5, None).score, 1.0);
        assert_eq!(EvalResult::graded(-0.2, None).score, 0.0);
        assert_eq!(EvalResult::graded(f64::NAN, None).score, 0.0);
    }

    #[test]
    fn test_graded_default_threshold() {
        assert!(EvalResult::graded(0.5, None).passed);
        assert!(!EvalResult::graded(0.49, None).passed);
    }

    #[test]
    fn test_graded_explicit_threshold() {
        assert!(EvalResult::graded(0.8, Some(0.8)).passed);
        assert!(!EvalResult::graded(0.79, Some(0.8)).passed);
    }

    #[test]
    fn test_failure_carries_feedback() {
        let result = EvalResult::failure("Evaluation failed: judge unavailable");
        assert_eq!(result.score, 0.0);
        assert!(!result.passed);
        assert!(result.feedback.as_deref().unwrap().contains("judge unavailable"));
    }
}
