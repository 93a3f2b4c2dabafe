//! # evalkit-core
//!
//! Criterion aggregation engine for evaluating AI-generated outputs.
//!
//! Concrete evaluators implement [`CriterionScorer`] (one scoring function
//! per named criterion); the engine invokes it for every criterion in a
//! validated [`EvalConfig`], isolates per-criterion failures, aggregates the
//! scores, and produces an [`EvalReport`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use evalkit_core::{Criterion, EvalConfig, Evaluator, Subject};
//! use std::sync::Arc;
//!
//! let config = EvalConfig::new(vec![
//!     Criterion::new("relevance", "Output addresses the prompt").with_weight(0.6),
//!     Criterion::new("coherence", "Output is well structured").with_weight(0.4),
//! ]);
//!
//! let evaluator = Evaluator::new(Arc::new(my_scorer), config)?;
//! let report = evaluator.evaluate(&Subject::new(input, output)).await?;
//! assert!(report.passed, "{}", report.summary);
//! ```

pub mod criteria;
pub mod engine;
pub mod error;
pub mod result;
pub mod subject;

// Re-exports
pub use criteria::{
    AggregationMethod, Criterion, CustomAggregator, EvalConfig, DEFAULT_PASSING_THRESHOLD,
    WEIGHT_SUM_TOLERANCE,
};
pub use engine::{normalize_score, CriterionScorer, Evaluator};
pub use error::{EvalError, Result};
pub use result::{
    CriterionResult, EvalReport, EvalResult, EvaluatorInfo, DEFAULT_RESULT_THRESHOLD,
};
pub use subject::{DetailValue, Subject};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::criteria::{AggregationMethod, Criterion, EvalConfig};
    pub use crate::engine::{CriterionScorer, Evaluator};
    pub use crate::error::{EvalError, Result};
    pub use crate::result::{CriterionResult, EvalReport, EvalResult, EvaluatorInfo};
    pub use crate::subject::{DetailValue, Subject};
}
