//! # evalkit-stats
//!
//! Statistical analysis engine for Evalkit evaluation results.
//!
//! Pure, stateless computations over sequences of scores or
//! already-produced results:
//!
//! - **Descriptive summaries**: mean, median, multimodal mode, population
//!   variance, quartiles, percentiles, skewness, kurtosis
//! - **Performance metrics**: confusion-matrix-derived accuracy, precision,
//!   recall, F1, specificity and MCC
//! - **Correlation**: full Pearson matrices over metrics extracted from
//!   result details
//! - **Trend analysis**: least-squares regression, volatility
//!   classification and a short forecast
//! - **Comparison**: baseline vs. treatment effect sizes and approximate
//!   significance
//!
//! Significance testing here is intentionally approximate (coarse critical
//! value tables, normal-tail cutoffs); it is meant for operator-facing
//! summaries, not publication-grade inference.

pub mod comparison;
pub mod correlation;
pub mod descriptive;
pub mod performance;
pub mod trend;

// Re-exports
pub use comparison::{compare, ComparisonReport, SIGNIFICANCE_T};
pub use correlation::{
    correlation_matrix, pearson, CorrelationMatrix, CorrelationStrength,
    SignificantCorrelation, SIGNIFICANCE_THRESHOLD,
};
pub use descriptive::{
    confidence_interval, describe, detect_outliers, mean, percentile, population_std_dev,
    ConfidenceInterval, DescriptiveStats, Quartiles,
};
pub use performance::{
    performance_metrics, ConfusionMatrix, PerformanceMetrics, DEFAULT_PREDICTION_THRESHOLD,
};
pub use trend::{
    analyze_trend, ForecastPoint, TrendAnalysis, TrendDirection, STABLE_SLOPE_EPSILON,
    VOLATILITY_THRESHOLD,
};
