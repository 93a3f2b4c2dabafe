//! Batch evaluation with per-subject fault isolation
//!
//! A batch runs every subject against a suite's evaluators under a bounded
//! fan-out. Per-subject failures (including panicking scorers) are recorded,
//! never propagated; only configuration problems fail the batch itself.

use crate::service::{composite_result, EvalService};
use chrono::{DateTime, Utc};
use evalkit_core::{EvalConfig, EvalError, EvalReport, EvalResult, Evaluator, Result, Subject};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Subjects evaluated concurrently when the options leave it unset
pub const DEFAULT_PARALLELISM: usize = 4;

/// How many top/bottom performers a batch summary names
const RANKED_N: usize = 3;

/// Invoked after each subject settles, with (finished, total)
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Invoked for each failed subject, with its input index and the error
pub type ErrorCallback = Arc<dyn Fn(usize, &EvalError) + Send + Sync>;

/// A named bundle of evaluators used to evaluate many subjects uniformly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalSuite {
    pub id: String,
    pub name: String,
    /// Registered evaluator names the suite runs
    pub evaluators: Vec<String>,
    /// Replaces every evaluator's configuration for this run, when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<EvalConfig>,
}

impl EvalSuite {
    /// Create an empty suite
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), evaluators: Vec::new(), config: None }
    }

    /// Add one evaluator by registry name
    pub fn with_evaluator(mut self, name: impl Into<String>) -> Self {
        self.evaluators.push(name.into());
        self
    }

    /// Override the evaluators' configuration for this suite
    pub fn with_config(mut self, config: EvalConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// Execution knobs for one batch run
#[derive(Clone, Default)]
pub struct BatchOptions {
    /// Bounded fan-out; defaults to [`DEFAULT_PARALLELISM`]
    pub parallelism: Option<usize>,
    /// Called synchronously as each subject settles
    pub progress: Option<ProgressCallback>,
    /// Called synchronously for each failed subject
    pub on_error: Option<ErrorCallback>,
    /// Cooperative abort: once set, not-yet-started subjects are skipped
    /// (and recorded as errors) while in-flight ones finish
    pub abort: Option<Arc<AtomicBool>>,
}

impl BatchOptions {
    /// Set the fan-out limit
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = Some(parallelism);
        self
    }

    /// Install a progress callback
    pub fn with_progress(mut self, callback: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Install a per-error callback
    pub fn with_on_error(
        mut self,
        callback: impl Fn(usize, &EvalError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Install an abort flag
    pub fn with_abort(mut self, abort: Arc<AtomicBool>) -> Self {
        self.abort = Some(abort);
        self
    }
}

/// One failed subject, preserved alongside the successes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Position of the subject in the batch input
    pub index: usize,
    /// Human-readable failure reason
    pub error: String,
    /// The subject that failed
    pub subject: Subject,
}

/// A ranked subject in the batch summary
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SubjectRank {
    /// Position of the subject in the batch input
    pub index: usize,
    pub score: f64,
}

/// Operator-facing batch digest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub average_score: f64,
    /// Fraction of completed subjects that passed
    pub pass_rate: f64,
    /// Highest-scoring subjects, ties broken by input order
    pub top_performers: Vec<SubjectRank>,
    /// Lowest-scoring subjects, ties broken by input order
    pub bottom_performers: Vec<SubjectRank>,
}

/// Outcome of a whole batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_id: String,
    pub suite_id: String,
    pub total_subjects: usize,
    /// Subjects that produced a result
    pub completed: usize,
    /// Subjects that ended in a recorded error
    pub failed: usize,
    /// Per-subject composite results, input order (failed subjects omitted)
    pub results: Vec<EvalResult>,
    /// Named aggregates over the completed subjects' scores
    pub aggregated_scores: HashMap<String, f64>,
    pub summary: BatchSummary,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Wall clock across the whole batch
    pub execution_time: Duration,
    /// Failed subjects, ordered by input index
    pub errors: Vec<BatchError>,
}

impl EvalService {
    /// Evaluate every subject against the suite, independently.
    ///
    /// Fails fatally only on configuration errors (empty suite, unknown
    /// evaluator names, invalid config override). Everything per-subject is
    /// fail-soft: errors, including panics unwinding out of a scorer, land in
    /// the batch `errors` list and the run continues. Statistics are computed
    /// in one sequential pass after the last subject settles.
    #[instrument(skip_all, fields(suite = %suite.id, total = subjects.len()))]
    pub async fn evaluate_batch(
        &self,
        suite: &EvalSuite,
        subjects: Vec<Subject>,
        options: BatchOptions,
    ) -> Result<BatchResult> {
        if suite.evaluators.is_empty() {
            return Err(EvalError::Config(format!("suite '{}' names no evaluators", suite.id)));
        }

        let mut evaluators: Vec<(String, Arc<Evaluator>)> =
            Vec::with_capacity(suite.evaluators.len());
        for name in &suite.evaluators {
            let evaluator = self.resolve(name)?;
            let evaluator = match &suite.config {
                Some(config) => Arc::new(evaluator.with_config(config.clone())?),
                None => evaluator,
            };
            evaluators.push((name.clone(), evaluator));
        }
        let evaluators = Arc::new(evaluators);

        let total = subjects.len();
        let started_at = Utc::now();
        let clock = Instant::now();
        let parallelism = options.parallelism.unwrap_or(DEFAULT_PARALLELISM).max(1);

        info!(parallelism, "starting batch evaluation");

        let abort = options.abort.clone();
        let mut settled = stream::iter(subjects.into_iter().enumerate())
            .map(|(index, subject)| {
                let evaluators = Arc::clone(&evaluators);
                let abort = abort.clone();
                async move {
                    if abort.as_ref().is_some_and(|flag| flag.load(Ordering::SeqCst)) {
                        let error = EvalError::Batch("aborted before evaluation".to_string());
                        return (index, subject, Err(error));
                    }
                    let outcome = AssertUnwindSafe(evaluate_subject(&evaluators, &subject))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| {
                            Err(EvalError::Batch(format!(
                                "evaluation panicked: {}",
                                panic_message(panic.as_ref())
                            )))
                        });
                    (index, subject, outcome)
                }
            })
            .buffer_unordered(parallelism);

        let mut indexed_results: Vec<(usize, EvalResult)> = Vec::new();
        let mut errors: Vec<BatchError> = Vec::new();
        let mut finished = 0usize;

        while let Some((index, subject, outcome)) = settled.next().await {
            finished += 1;
            match outcome {
                Ok(result) => indexed_results.push((index, result)),
                Err(error) => {
                    warn!(index, %error, "subject evaluation failed");
                    if let Some(callback) = &options.on_error {
                        callback(index, &error);
                    }
                    errors.push(BatchError { index, error: error.to_string(), subject });
                }
            }
            if let Some(callback) = &options.progress {
                callback(finished, total);
            }
        }
        drop(settled);

        indexed_results.sort_by_key(|(index, _)| *index);
        errors.sort_by_key(|e| e.index);

        let completed = indexed_results.len();
        let failed = errors.len();

        // Single sequential fold, only after every subject has settled
        let scores: Vec<f64> = indexed_results.iter().map(|(_, r)| r.score).collect();
        let mut aggregated_scores = HashMap::new();
        let mut summary = BatchSummary::default();
        if let Ok(stats) = evalkit_stats::describe(&scores) {
            let pass_count = indexed_results.iter().filter(|(_, r)| r.passed).count();
            let pass_rate = pass_count as f64 / completed as f64;

            aggregated_scores.insert("mean".to_string(), stats.mean);
            aggregated_scores.insert("median".to_string(), stats.median);
            aggregated_scores.insert("std_dev".to_string(), stats.std_dev);
            aggregated_scores.insert("min".to_string(), stats.min);
            aggregated_scores.insert("max".to_string(), stats.max);
            aggregated_scores.insert("pass_rate".to_string(), pass_rate);

            summary = BatchSummary {
                average_score: stats.mean,
                pass_rate,
                top_performers: rank(&indexed_results, true),
                bottom_performers: rank(&indexed_results, false),
            };
        }

        info!(completed, failed, "batch evaluation finished");

        Ok(BatchResult {
            batch_id: uuid::Uuid::new_v4().to_string(),
            suite_id: suite.id.clone(),
            total_subjects: total,
            completed,
            failed,
            results: indexed_results.into_iter().map(|(_, r)| r).collect(),
            aggregated_scores,
            summary,
            started_at,
            completed_at: Utc::now(),
            execution_time: clock.elapsed(),
            errors,
        })
    }
}

/// Run every suite evaluator against one subject and fold the reports into
/// the subject's composite result
async fn evaluate_subject(
    evaluators: &[(String, Arc<Evaluator>)],
    subject: &Subject,
) -> Result<EvalResult> {
    let outcomes: Vec<(String, Result<EvalReport>)> =
        join_all(evaluators.iter().map(|(name, evaluator)| async move {
            (name.clone(), evaluator.evaluate(subject).await)
        }))
        .await;
    Ok(composite_result(&outcomes, true))
}

fn rank(indexed: &[(usize, EvalResult)], descending: bool) -> Vec<SubjectRank> {
    let mut ranks: Vec<SubjectRank> = indexed
        .iter()
        .map(|(index, result)| SubjectRank { index: *index, score: result.score })
        .collect();
    ranks.sort_by(|a, b| {
        let by_score = if descending {
            b.score.partial_cmp(&a.score)
        } else {
            a.score.partial_cmp(&b.score)
        }
        .unwrap_or(std::cmp::Ordering::Equal);
        by_score.then(a.index.cmp(&b.index))
    });
    ranks.truncate(RANKED_N);
    ranks
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
