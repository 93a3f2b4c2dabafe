//! Integration tests for batch orchestration: fault isolation, callbacks,
//! bounded fan-out, abort, and the post-run statistics fold.

use async_trait::async_trait;
use evalkit_core::{
    Criterion, CriterionScorer, DetailValue, EvalConfig, EvalError, EvalResult, Evaluator,
    Result, Subject,
};
use evalkit_runner::{BatchOptions, EvalService, EvalSuite};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scorer driven by subject metadata: `score` sets the score, `explode`
/// panics mid-evaluation (the batch must survive it)
struct MetadataScorer;

#[async_trait]
impl CriterionScorer for MetadataScorer {
    fn name(&self) -> &str {
        "metadata"
    }

    async fn score_criterion(
        &self,
        criterion: &Criterion,
        subject: &Subject,
    ) -> Result<EvalResult> {
        if subject.metadata.get("explode").and_then(DetailValue::as_flag) == Some(true) {
            panic!("scorer exploded");
        }
        let score =
            subject.metadata.get("score").and_then(DetailValue::as_number).unwrap_or(0.5);
        Ok(EvalResult::graded(score, criterion.threshold))
    }
}

fn metadata_service() -> EvalService {
    let config = EvalConfig::new(vec![Criterion::new("overall", "Metadata-driven criterion")]);
    let evaluator = Evaluator::new(Arc::new(MetadataScorer), config).unwrap();
    let service = EvalService::new();
    service.add_evaluator("metadata", evaluator);
    service
}

fn scored_subject(score: f64) -> Subject {
    Subject::new("in", "out").with_metadata("score", score)
}

fn exploding_subject() -> Subject {
    Subject::new("in", "out").with_metadata("explode", true)
}

fn suite() -> EvalSuite {
    EvalSuite::new("batch-1", "Metadata batch").with_evaluator("metadata")
}

#[tokio::test]
async fn batch_isolates_a_panicking_subject() {
    evalkit_telemetry::init("evalkit-batch-tests");
    let service = metadata_service();
    let subjects = vec![
        scored_subject(0.9),
        scored_subject(0.8),
        exploding_subject(),
        scored_subject(0.4),
        scored_subject(0.6),
    ];

    let batch = service
        .evaluate_batch(&suite(), subjects, BatchOptions::default())
        .await
        .unwrap();

    assert_eq!(batch.total_subjects, 5);
    assert_eq!(batch.completed, 4);
    assert_eq!(batch.failed, 1);
    assert_eq!(batch.errors.len(), 1);
    assert_eq!(batch.errors[0].index, 2);
    assert!(batch.errors[0].error.contains("panicked"));

    // Completed results keep input order with the failure removed
    let scores: Vec<f64> = batch.results.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![0.9, 0.8, 0.4, 0.6]);
}

#[tokio::test]
async fn batch_summary_and_aggregates() {
    let service = metadata_service();
    let subjects = vec![
        scored_subject(0.9),
        scored_subject(0.8),
        scored_subject(0.4),
        scored_subject(0.6),
    ];

    let batch = service
        .evaluate_batch(&suite(), subjects, BatchOptions::default())
        .await
        .unwrap();

    assert!((batch.summary.average_score - 0.675).abs() < 1e-9);
    // 0.9 and 0.8 clear the default 0.7 passing threshold
    assert!((batch.summary.pass_rate - 0.5).abs() < 1e-9);

    let top: Vec<usize> = batch.summary.top_performers.iter().map(|r| r.index).collect();
    assert_eq!(top, vec![0, 1, 3]);
    let bottom: Vec<usize> =
        batch.summary.bottom_performers.iter().map(|r| r.index).collect();
    assert_eq!(bottom, vec![2, 3, 1]);

    assert!((batch.aggregated_scores["mean"] - 0.675).abs() < 1e-9);
    assert!((batch.aggregated_scores["min"] - 0.4).abs() < 1e-9);
    assert!((batch.aggregated_scores["max"] - 0.9).abs() < 1e-9);
    assert!((batch.aggregated_scores["pass_rate"] - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn batch_ranking_ties_keep_input_order() {
    let service = metadata_service();
    let subjects = vec![
        scored_subject(0.5),
        scored_subject(0.5),
        scored_subject(0.5),
        scored_subject(0.5),
    ];

    let batch = service
        .evaluate_batch(&suite(), subjects, BatchOptions::default())
        .await
        .unwrap();

    let top: Vec<usize> = batch.summary.top_performers.iter().map(|r| r.index).collect();
    assert_eq!(top, vec![0, 1, 2]);
    let bottom: Vec<usize> =
        batch.summary.bottom_performers.iter().map(|r| r.index).collect();
    assert_eq!(bottom, vec![0, 1, 2]);
}

#[tokio::test]
async fn batch_callbacks_fire_per_subject() {
    let service = metadata_service();
    let subjects = vec![scored_subject(0.9), exploding_subject(), scored_subject(0.6)];

    let progress_calls = Arc::new(AtomicUsize::new(0));
    let error_indices: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));

    let options = BatchOptions::default()
        .with_progress({
            let calls = Arc::clone(&progress_calls);
            move |finished, total| {
                assert!(finished <= total);
                calls.fetch_add(1, Ordering::SeqCst);
            }
        })
        .with_on_error({
            let indices = Arc::clone(&error_indices);
            move |index, error| {
                assert!(matches!(error, EvalError::Batch(_)));
                indices.lock().unwrap().push(index);
            }
        });

    let batch = service.evaluate_batch(&suite(), subjects, options).await.unwrap();

    assert_eq!(batch.completed, 2);
    assert_eq!(progress_calls.load(Ordering::SeqCst), 3);
    assert_eq!(*error_indices.lock().unwrap(), vec![1]);
}

#[tokio::test]
async fn batch_abort_skips_unscheduled_subjects() {
    let service = metadata_service();
    let subjects: Vec<Subject> = (0..5).map(|_| scored_subject(0.9)).collect();

    let abort = Arc::new(AtomicBool::new(false));
    let options = BatchOptions::default()
        .with_parallelism(1)
        .with_abort(Arc::clone(&abort))
        .with_progress({
            let abort = Arc::clone(&abort);
            move |_, _| abort.store(true, Ordering::SeqCst)
        });

    let batch = service.evaluate_batch(&suite(), subjects, options).await.unwrap();

    // The first subject finishes; everything not yet scheduled is recorded
    assert_eq!(batch.completed, 1);
    assert_eq!(batch.failed, 4);
    assert!(batch.errors.iter().all(|e| e.error.contains("aborted")));
    assert_eq!(batch.total_subjects, 5);
}

#[tokio::test]
async fn batch_config_errors_are_fatal() {
    let service = metadata_service();

    // Empty suite
    let empty = EvalSuite::new("empty", "No evaluators");
    let err = service
        .evaluate_batch(&empty, vec![scored_subject(0.5)], BatchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EvalError::Config(_)));

    // Unknown evaluator name
    let unknown = EvalSuite::new("unknown", "Unknown").with_evaluator("missing");
    let err = service
        .evaluate_batch(&unknown, vec![scored_subject(0.5)], BatchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EvalError::EvaluatorNotFound(_)));

    // Invalid config override
    let bad_override = suite().with_config(EvalConfig::new(vec![]));
    let err = service
        .evaluate_batch(&bad_override, vec![scored_subject(0.5)], BatchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EvalError::Config(_)));
}

#[tokio::test]
async fn batch_config_override_applies() {
    let service = metadata_service();

    // Raise the passing threshold beyond every score in the batch
    let strict = suite().with_config(
        EvalConfig::new(vec![Criterion::new("overall", "")]).with_passing_threshold(0.95),
    );

    let batch = service
        .evaluate_batch(&strict, vec![scored_subject(0.9)], BatchOptions::default())
        .await
        .unwrap();

    assert_eq!(batch.completed, 1);
    assert!(!batch.results[0].passed);
}

#[tokio::test]
async fn batch_with_no_subjects_is_empty_but_ok() {
    let service = metadata_service();
    let batch = service
        .evaluate_batch(&suite(), Vec::new(), BatchOptions::default())
        .await
        .unwrap();

    assert_eq!(batch.total_subjects, 0);
    assert_eq!(batch.completed, 0);
    assert_eq!(batch.failed, 0);
    assert!(batch.aggregated_scores.is_empty());
    assert!(batch.results.is_empty());
}
