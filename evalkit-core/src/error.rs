//! Error types shared across the Evalkit workspace

use thiserror::Error;

/// Result type alias for evaluation operations
pub type Result<T> = std::result::Result<T, EvalError>;

/// Errors that can occur while configuring or running evaluations
#[derive(Error, Debug)]
pub enum EvalError {
    /// Invalid evaluator configuration, raised before any subject is evaluated
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A criterion scoring function failed
    #[error("Scoring error: {0}")]
    Scoring(String),

    /// Requested evaluator is not registered
    #[error("Evaluator not found: {0}")]
    EvaluatorNotFound(String),

    /// Batch-level orchestration failure
    #[error("Batch error: {0}")]
    Batch(String),

    /// A statistical computation was given too little data
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Export or import failure
    #[error("Export error: {0}")]
    Export(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EvalError::Config("weights must be non-negative".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: weights must be non-negative");
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<i32>("not json").unwrap_err();
        let err: EvalError = json_err.into();
        assert!(matches!(err, EvalError::Json(_)));
    }
}
