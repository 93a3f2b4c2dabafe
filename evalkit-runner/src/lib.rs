//! # evalkit-runner
//!
//! Batch orchestration for Evalkit: a registry of named evaluators, single
//! and comprehensive (multi-evaluator) dispatch, fault-isolated batch runs
//! over many subjects, and a bounded history of past outcomes.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use evalkit_runner::{BatchOptions, EvalService, EvalSuite};
//!
//! let service = EvalService::new();
//! service.add_evaluator("quality", quality_evaluator);
//! service.add_evaluator("safety", safety_evaluator);
//!
//! let suite = EvalSuite::new("nightly", "Nightly regression")
//!     .with_evaluator("quality")
//!     .with_evaluator("safety");
//!
//! let batch = service.evaluate_batch(&suite, subjects, BatchOptions::default()).await?;
//! println!("{}/{} passed", batch.completed, batch.total_subjects);
//! ```

pub mod batch;
pub mod history;
pub mod service;

// Re-exports
pub use batch::{
    BatchError, BatchOptions, BatchResult, BatchSummary, ErrorCallback, EvalSuite,
    ProgressCallback, SubjectRank, DEFAULT_PARALLELISM,
};
pub use history::{EvalHistory, HistoryEntry, HistoryStats, DEFAULT_HISTORY_CAPACITY};
pub use service::{
    EvalRequest, EvalResponse, EvalService, EvalTarget, RequestOptions, COMPREHENSIVE,
};
