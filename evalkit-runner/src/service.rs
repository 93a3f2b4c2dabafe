//! Evaluator registry and request dispatch

use crate::history::{EvalHistory, DEFAULT_HISTORY_CAPACITY};
use evalkit_core::{
    Criterion, DetailValue, EvalError, EvalReport, EvalResult, Evaluator, Result, Subject,
};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// History label for comprehensive (multi-evaluator) composites
pub const COMPREHENSIVE: &str = "comprehensive";

/// Which evaluator(s) a request runs
#[derive(Debug, Clone)]
pub enum EvalTarget {
    /// One registered evaluator by name
    Named(String),
    /// Fold several evaluators' verdicts into one composite result
    Comprehensive,
}

/// Knobs for a single evaluation request
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Attach per-evaluator scores to a composite result's details
    pub include_details: bool,
    /// Also return the full per-evaluator reports on comprehensive runs
    pub generate_reports: bool,
    /// Record the outcome in the service history
    pub save_results: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self { include_details: true, generate_reports: false, save_results: true }
    }
}

/// One evaluation request against the service
#[derive(Debug, Clone)]
pub struct EvalRequest {
    pub target: EvalTarget,
    pub subject: Subject,
    /// Evaluator subset for comprehensive runs; `None` means all registered
    pub evaluators: Option<Vec<String>>,
    /// Replaces the criteria of every evaluator this request runs; thresholds
    /// and aggregation stay the evaluator's own. Validated before scoring.
    pub custom_criteria: Option<Vec<Criterion>>,
    pub options: RequestOptions,
}

impl EvalRequest {
    /// Request against one named evaluator
    pub fn named(name: impl Into<String>, subject: Subject) -> Self {
        Self {
            target: EvalTarget::Named(name.into()),
            subject,
            evaluators: None,
            custom_criteria: None,
            options: RequestOptions::default(),
        }
    }

    /// Comprehensive request across registered evaluators
    pub fn comprehensive(subject: Subject) -> Self {
        Self {
            target: EvalTarget::Comprehensive,
            subject,
            evaluators: None,
            custom_criteria: None,
            options: RequestOptions::default(),
        }
    }

    /// Restrict a comprehensive run to the given evaluators
    pub fn with_evaluators(mut self, names: Vec<String>) -> Self {
        self.evaluators = Some(names);
        self
    }

    /// Evaluate against these criteria instead of the evaluator's own
    pub fn with_custom_criteria(mut self, criteria: Vec<Criterion>) -> Self {
        self.custom_criteria = Some(criteria);
        self
    }

    /// Replace the request options
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

/// What a request produced
#[derive(Debug, Clone)]
pub enum EvalResponse {
    /// Full report from a single named evaluator
    Report(Box<EvalReport>),
    /// Composite outcome of a comprehensive run; `reports` is populated only
    /// when the request asked for them
    Composite { result: EvalResult, reports: Vec<(String, EvalReport)> },
}

impl EvalResponse {
    /// Overall score regardless of response shape
    pub fn overall_score(&self) -> f64 {
        match self {
            EvalResponse::Report(report) => report.overall_score,
            EvalResponse::Composite { result, .. } => result.score,
        }
    }

    /// Pass flag regardless of response shape
    pub fn passed(&self) -> bool {
        match self {
            EvalResponse::Report(report) => report.passed,
            EvalResponse::Composite { result, .. } => result.passed,
        }
    }
}

/// Registry of named evaluators plus the shared evaluation history.
///
/// The registry and history are the only shared mutable state in the
/// workspace; both serialize writers behind locks so the service can be
/// used from concurrent tasks through an `Arc`.
pub struct EvalService {
    evaluators: RwLock<HashMap<String, Arc<Evaluator>>>,
    history: EvalHistory,
}

impl EvalService {
    /// Service with the default history capacity
    pub fn new() -> Self {
        Self::with_history_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Service retaining at most `capacity` history entries
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self { evaluators: RwLock::new(HashMap::new()), history: EvalHistory::new(capacity) }
    }

    /// Register an evaluator under a name, replacing any previous holder
    pub fn add_evaluator(&self, name: impl Into<String>, evaluator: Evaluator) {
        let name = name.into();
        debug!(evaluator = %name, "registering evaluator");
        self.evaluators.write().unwrap().insert(name, Arc::new(evaluator));
    }

    /// Deregister an evaluator; `false` when the name was never registered
    pub fn remove_evaluator(&self, name: &str) -> bool {
        self.evaluators.write().unwrap().remove(name).is_some()
    }

    /// Names of all registered evaluators, sorted for determinism
    pub fn available_evaluators(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.evaluators.read().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    /// The shared evaluation history
    pub fn history(&self) -> &EvalHistory {
        &self.history
    }

    pub(crate) fn resolve(&self, name: &str) -> Result<Arc<Evaluator>> {
        self.evaluators
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::EvaluatorNotFound(name.to_string()))
    }

    /// Dispatch one request to a named evaluator or a comprehensive run
    pub async fn evaluate(&self, request: EvalRequest) -> Result<EvalResponse> {
        match &request.target {
            EvalTarget::Named(name) => {
                let evaluator = self.resolve(name)?;
                let evaluator = apply_custom_criteria(evaluator, &request.custom_criteria)?;
                let report = evaluator.evaluate(&request.subject).await?;
                if request.options.save_results {
                    let mut recorded = EvalResult::graded(report.overall_score, None)
                        .with_feedback(report.summary.clone());
                    recorded.passed = report.passed;
                    self.history.record(name, recorded);
                }
                Ok(EvalResponse::Report(Box::new(report)))
            }
            EvalTarget::Comprehensive => self.evaluate_comprehensive(&request).await,
        }
    }

    async fn evaluate_comprehensive(&self, request: &EvalRequest) -> Result<EvalResponse> {
        let names = match &request.evaluators {
            Some(names) if !names.is_empty() => names.clone(),
            _ => self.available_evaluators(),
        };
        if names.is_empty() {
            return Err(EvalError::Config(
                "comprehensive evaluation requires at least one registered evaluator".to_string(),
            ));
        }

        // Unknown names are configuration errors, raised before any scoring
        let selected: Vec<(String, Arc<Evaluator>)> = names
            .iter()
            .map(|name| {
                self.resolve(name)
                    .and_then(|e| apply_custom_criteria(e, &request.custom_criteria))
                    .map(|e| (name.clone(), e))
            })
            .collect::<Result<Vec<_>>>()?;

        let subject = &request.subject;
        let outcomes: Vec<(String, Result<EvalReport>)> =
            join_all(selected.iter().map(|(name, evaluator)| async move {
                (name.clone(), evaluator.evaluate(subject).await)
            }))
            .await;

        let result = composite_result(&outcomes, request.options.include_details);
        if request.options.save_results {
            self.history.record(COMPREHENSIVE, result.clone());
        }

        let reports = if request.options.generate_reports {
            outcomes
                .into_iter()
                .filter_map(|(name, outcome)| outcome.ok().map(|report| (name, report)))
                .collect()
        } else {
            Vec::new()
        };

        Ok(EvalResponse::Composite { result, reports })
    }
}

impl Default for EvalService {
    fn default() -> Self {
        Self::new()
    }
}

/// Swap in request-level criteria, revalidating the resulting config; the
/// evaluator's own thresholds and aggregation method are kept
fn apply_custom_criteria(
    evaluator: Arc<Evaluator>,
    custom_criteria: &Option<Vec<Criterion>>,
) -> Result<Arc<Evaluator>> {
    match custom_criteria {
        Some(criteria) if !criteria.is_empty() => {
            let mut config = evaluator.config().clone();
            config.criteria = criteria.clone();
            Ok(Arc::new(evaluator.with_config(config)?))
        }
        _ => Ok(evaluator),
    }
}

/// Fold per-evaluator reports into one composite result: arithmetic mean of
/// the overall scores, passed only when every report passed. An evaluator
/// that errored contributes a zero score and fails the composite.
pub(crate) fn composite_result(
    outcomes: &[(String, Result<EvalReport>)],
    include_details: bool,
) -> EvalResult {
    let mut sum = 0.0;
    let mut all_passed = true;
    let mut details = HashMap::new();
    let mut failures = Vec::new();

    for (name, outcome) in outcomes {
        match outcome {
            Ok(report) => {
                sum += report.overall_score;
                all_passed &= report.passed;
                if include_details {
                    details.insert(name.clone(), DetailValue::Number(report.overall_score));
                }
            }
            Err(error) => {
                warn!(evaluator = %name, %error, "evaluator failed during comprehensive run");
                all_passed = false;
                failures.push(format!("{}: {}", name, error));
                if include_details {
                    details.insert(name.clone(), DetailValue::Number(0.0));
                }
            }
        }
    }

    let feedback = if failures.is_empty() {
        format!("Composite of {} evaluators", outcomes.len())
    } else {
        format!(
            "Composite of {} evaluators; failures: {}",
            outcomes.len(),
            failures.join("; ")
        )
    };

    let mut result = EvalResult::graded(sum / outcomes.len() as f64, None);
    result.passed = all_passed;
    result.details = details;
    result.with_feedback(feedback)
}
