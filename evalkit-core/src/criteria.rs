//! Criterion and configuration model for evaluators

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Allowed deviation of the criterion weight sum from 1.0 before
/// renormalization kicks in
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-3;

/// Default passing threshold for an overall evaluation
pub const DEFAULT_PASSING_THRESHOLD: f64 = 0.7;

/// One named, weighted dimension of evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criterion {
    /// Criterion name, unique within a configuration
    pub name: String,

    /// What this criterion measures
    #[serde(default)]
    pub description: String,

    /// Relative weight, normalized so all weights in a config sum to 1.0
    #[serde(default = "default_weight")]
    pub weight: f64,

    /// Per-criterion pass threshold (0.0 - 1.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// A failing required criterion fails the whole report, regardless of
    /// the overall score
    #[serde(default)]
    pub required: bool,
}

impl Criterion {
    /// Create a new criterion with weight 1.0
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            weight: 1.0,
            threshold: None,
            required: false,
        }
    }

    /// Set weight
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Set the per-criterion pass threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Mark this criterion as mandatory
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

fn default_weight() -> f64 {
    1.0
}

/// Rule for combining per-criterion scores into one overall score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMethod {
    /// Sum of score times normalized weight
    #[default]
    WeightedAverage,
    /// Lowest raw criterion score, weights ignored
    Minimum,
    /// Highest raw criterion score, weights ignored
    Maximum,
    /// User-supplied aggregation function
    Custom,
}

/// User-supplied aggregation over parallel score/weight slices
#[derive(Clone)]
pub struct CustomAggregator(Arc<dyn Fn(&[f64], &[f64]) -> f64 + Send + Sync>);

impl CustomAggregator {
    /// Wrap an aggregation function
    pub fn new(f: impl Fn(&[f64], &[f64]) -> f64 + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Apply the aggregation to parallel score/weight slices
    pub fn apply(&self, scores: &[f64], weights: &[f64]) -> f64 {
        (self.0)(scores, weights)
    }
}

impl fmt::Debug for CustomAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomAggregator")
    }
}

/// Evaluator configuration: the criteria set plus aggregation rules.
///
/// A config is only usable after [`EvalConfig::validate`] has run; the
/// [`Evaluator`](crate::Evaluator) constructor and every mutation operation
/// re-run it, so a live evaluator never holds an invalid set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Criteria in declaration order; report results keep this order
    pub criteria: Vec<Criterion>,

    /// Overall score at or above which a subject passes (0.0 - 1.0)
    #[serde(default = "default_passing_threshold")]
    pub passing_threshold: f64,

    /// How per-criterion scores fold into the overall score
    #[serde(default)]
    pub aggregation: AggregationMethod,

    /// Aggregation function for [`AggregationMethod::Custom`]
    #[serde(skip)]
    pub custom_aggregator: Option<CustomAggregator>,
}

fn default_passing_threshold() -> f64 {
    DEFAULT_PASSING_THRESHOLD
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            criteria: Vec::new(),
            passing_threshold: DEFAULT_PASSING_THRESHOLD,
            aggregation: AggregationMethod::WeightedAverage,
            custom_aggregator: None,
        }
    }
}

impl EvalConfig {
    /// Create a config with the given criteria and default thresholds
    pub fn new(criteria: Vec<Criterion>) -> Self {
        Self { criteria, ..Default::default() }
    }

    /// Set the overall passing threshold
    pub fn with_passing_threshold(mut self, threshold: f64) -> Self {
        self.passing_threshold = threshold;
        self
    }

    /// Set the aggregation method
    pub fn with_aggregation(mut self, aggregation: AggregationMethod) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Install a custom aggregation function and select custom aggregation
    pub fn with_custom_aggregator(
        mut self,
        f: impl Fn(&[f64], &[f64]) -> f64 + Send + Sync + 'static,
    ) -> Self {
        self.aggregation = AggregationMethod::Custom;
        self.custom_aggregator = Some(CustomAggregator::new(f));
        self
    }

    /// Validate the configuration, renormalizing criterion weights in place.
    ///
    /// Weights are rescaled by `weight / sum` whenever their sum strays more
    /// than [`WEIGHT_SUM_TOLERANCE`] from 1.0. Fatal errors: empty criteria,
    /// blank or duplicate names, negative or non-finite weights, out-of-range
    /// thresholds, and custom aggregation without an aggregator.
    pub fn validate(&mut self) -> Result<()> {
        if self.criteria.is_empty() {
            return Err(EvalError::Config("at least one criterion is required".to_string()));
        }

        if !(0.0..=1.0).contains(&self.passing_threshold) {
            return Err(EvalError::Config(format!(
                "passing threshold {} is outside [0, 1]",
                self.passing_threshold
            )));
        }

        let mut seen = HashSet::new();
        for criterion in &self.criteria {
            if criterion.name.trim().is_empty() {
                return Err(EvalError::Config("criterion names must be non-empty".to_string()));
            }
            if !seen.insert(criterion.name.as_str()) {
                return Err(EvalError::Config(format!(
                    "duplicate criterion name '{}'",
                    criterion.name
                )));
            }
            if !criterion.weight.is_finite() || criterion.weight < 0.0 {
                return Err(EvalError::Config(format!(
                    "criterion '{}' has invalid weight {}; weights must be non-negative",
                    criterion.name, criterion.weight
                )));
            }
            if let Some(threshold) = criterion.threshold {
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(EvalError::Config(format!(
                        "criterion '{}' has threshold {} outside [0, 1]",
                        criterion.name, threshold
                    )));
                }
            }
        }

        let sum: f64 = self.criteria.iter().map(|c| c.weight).sum();
        if sum <= 0.0 {
            return Err(EvalError::Config(
                "criterion weights must sum to a positive value".to_string(),
            ));
        }
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            for criterion in &mut self.criteria {
                criterion.weight /= sum;
            }
        }

        if self.aggregation == AggregationMethod::Custom && self.custom_aggregator.is_none() {
            return Err(EvalError::Config(
                "custom aggregation selected without a custom aggregator".to_string(),
            ));
        }

        Ok(())
    }
}
