//! Criterion aggregation engine
//!
//! Scores every configured criterion through a pluggable [`CriterionScorer`]
//! and folds the per-criterion results into a single [`EvalReport`].

use crate::criteria::{AggregationMethod, Criterion, EvalConfig};
use crate::error::{EvalError, Result};
use crate::result::{clamp_unit, CriterionResult, EvalReport, EvalResult, EvaluatorInfo};
use crate::subject::Subject;
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// Scoring capability implemented by every concrete evaluator.
///
/// Implementations own the domain knowledge behind each named criterion
/// (keyword overlap, regex safety checks, a remote judge model, ...); the
/// engine only cares that one criterion and one subject go in and one
/// [`EvalResult`] comes out. Scoring may suspend, e.g. to call out to a
/// judge over the network.
#[async_trait]
pub trait CriterionScorer: Send + Sync {
    /// Evaluator name, unique within a registry
    fn name(&self) -> &str;

    /// Evaluator version, embedded in every report
    fn version(&self) -> &str {
        "0.1.0"
    }

    /// Score a single criterion for a single subject
    async fn score_criterion(&self, criterion: &Criterion, subject: &Subject)
        -> Result<EvalResult>;
}

/// Linearly rescale `value` from `[min, max]` onto `[0.0, 1.0]`, clamped.
///
/// A degenerate range (`max == min`) maps to 1.0 by convention rather than
/// failing.
pub fn normalize_score(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        return 1.0;
    }
    clamp_unit((value - min) / (max - min))
}

/// Aggregation engine binding a scorer to a validated configuration.
///
/// Construction validates (and weight-normalizes) the config, so a live
/// evaluator never holds an invalid criteria set.
pub struct Evaluator {
    scorer: Arc<dyn CriterionScorer>,
    config: EvalConfig,
}

impl Evaluator {
    /// Create an evaluator; fails on configuration errors
    pub fn new(scorer: Arc<dyn CriterionScorer>, mut config: EvalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { scorer, config })
    }

    /// The active (validated) configuration
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Identity and config snapshot embedded in reports
    pub fn info(&self) -> EvaluatorInfo {
        EvaluatorInfo {
            name: self.scorer.name().to_string(),
            version: self.scorer.version().to_string(),
            config: self.config.clone(),
        }
    }

    /// Clone this evaluator with a different configuration.
    ///
    /// The replacement config is validated before the new evaluator exists.
    pub fn with_config(&self, config: EvalConfig) -> Result<Self> {
        Self::new(self.scorer.clone(), config)
    }

    /// Evaluate one subject against every configured criterion.
    ///
    /// Criteria are scored concurrently, but `criteria_results` always
    /// follows declaration order: results are collected by criterion
    /// position, never by completion order. A scorer error for one criterion
    /// becomes a synthetic zero-score result so the remaining criteria still
    /// count (partial-failure isolation).
    pub async fn evaluate(&self, subject: &Subject) -> Result<EvalReport> {
        let scorer = &self.scorer;
        let futures = self.config.criteria.iter().map(|criterion| async move {
            match scorer.score_criterion(criterion, subject).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(criterion = %criterion.name, error = %e, "criterion scoring failed");
                    EvalResult::failure(format!("Evaluation failed: {}", e))
                }
            }
        });
        // join_all yields results in input order, i.e. declaration order
        let results: Vec<EvalResult> = join_all(futures).await;

        let scores: Vec<f64> = results.iter().map(|r| r.score).collect();
        let weights: Vec<f64> = self.config.criteria.iter().map(|c| c.weight).collect();
        let overall_score = self.aggregate(&scores, &weights)?;

        let required_ok = self
            .config
            .criteria
            .iter()
            .zip(&results)
            .all(|(criterion, result)| !criterion.required || result.passed);
        let passed = overall_score >= self.config.passing_threshold && required_ok;

        let passed_count = results.iter().filter(|r| r.passed).count();
        let summary = format!(
            "Evaluation {}: {:.0}% overall score, {}/{} criteria passed",
            if passed { "PASSED" } else { "FAILED" },
            overall_score * 100.0,
            passed_count,
            results.len()
        );

        let recommendations = self
            .config
            .criteria
            .iter()
            .zip(&results)
            .filter(|(_, result)| !result.passed)
            .filter_map(|(criterion, result)| {
                result
                    .feedback
                    .as_deref()
                    .filter(|feedback| !feedback.is_empty())
                    .map(|feedback| format!("{}: {}", criterion.name, feedback))
            })
            .collect();

        let criteria_results = self
            .config
            .criteria
            .iter()
            .zip(results)
            .map(|(criterion, result)| CriterionResult {
                criterion: criterion.name.clone(),
                result,
            })
            .collect();

        debug!(
            evaluator = %self.scorer.name(),
            overall_score,
            passed,
            "evaluation complete"
        );

        Ok(EvalReport {
            overall_score,
            passed,
            criteria_results,
            summary,
            recommendations,
            timestamp: Utc::now(),
            evaluator: self.info(),
        })
    }

    fn aggregate(&self, scores: &[f64], weights: &[f64]) -> Result<f64> {
        match self.config.aggregation {
            AggregationMethod::WeightedAverage => {
                Ok(scores.iter().zip(weights).map(|(s, w)| s * w).sum())
            }
            AggregationMethod::Minimum => {
                Ok(scores.iter().copied().fold(f64::INFINITY, f64::min))
            }
            AggregationMethod::Maximum => {
                Ok(scores.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            }
            AggregationMethod::Custom => {
                let aggregator = self.config.custom_aggregator.as_ref().ok_or_else(|| {
                    EvalError::Config(
                        "custom aggregation selected without a custom aggregator".to_string(),
                    )
                })?;
                Ok(clamp_unit(aggregator.apply(scores, weights)))
            }
        }
    }

    /// Append a criterion; the whole set is re-validated (and weights
    /// renormalized) before the change takes effect.
    pub fn add_criterion(&mut self, criterion: Criterion) -> Result<()> {
        let mut next = self.config.clone();
        next.criteria.push(criterion);
        next.validate()?;
        self.config = next;
        Ok(())
    }

    /// Remove a criterion by name. Returns `Ok(false)` when no criterion of
    /// that name exists, rather than an error.
    pub fn remove_criterion(&mut self, name: &str) -> Result<bool> {
        let mut next = self.config.clone();
        let before = next.criteria.len();
        next.criteria.retain(|c| c.name != name);
        if next.criteria.len() == before {
            return Ok(false);
        }
        next.validate()?;
        self.config = next;
        Ok(true)
    }

    /// Replace the configuration wholesale; validated before taking effect
    pub fn update_config(&mut self, mut config: EvalConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }
}
