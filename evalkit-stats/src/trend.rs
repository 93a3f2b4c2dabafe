//! Trend and forecast analysis over time-ordered scores

use crate::descriptive::{mean, population_std_dev};
use chrono::{DateTime, Utc};
use evalkit_core::{EvalError, Result};
use serde::{Deserialize, Serialize};

/// Coefficient of variation above which a series counts as volatile
pub const VOLATILITY_THRESHOLD: f64 = 0.3;

/// Slope magnitude below which a non-volatile series counts as stable
pub const STABLE_SLOPE_EPSILON: f64 = 0.01;

const FORECAST_STEPS: usize = 5;
const Z_95: f64 = 1.96;

/// Direction classification of a score series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    /// Coefficient of variation dominates any directional signal
    Volatile,
}

/// One forecast step ahead of the observed series
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Steps past the last observation, starting at 1
    pub step: usize,
    /// Fitted-line prediction
    pub value: f64,
    /// Lower bound, value - 1.96 * residual standard error
    pub lower: f64,
    /// Upper bound, value + 1.96 * residual standard error
    pub upper: f64,
}

/// Least-squares trend fit plus classification and forecast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub direction: TrendDirection,
    /// Regression slope per observation step
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Coefficient of variation (std dev / mean) of the raw values
    pub volatility: f64,
    /// Forecast confidence, reported as R²
    pub confidence: f64,
    /// Five steps ahead along the fitted line
    pub forecast: Vec<ForecastPoint>,
}

/// Fit an ordinary least-squares line over at least three time-ordered
/// points and classify the series.
///
/// The regression runs over the observation index (equal spacing assumed);
/// timestamps establish the ordering. Fails below three points.
pub fn analyze_trend(points: &[(DateTime<Utc>, f64)]) -> Result<TrendAnalysis> {
    if points.len() < 3 {
        return Err(EvalError::InsufficientData(format!(
            "trend analysis requires at least 3 points, got {}",
            points.len()
        )));
    }

    let mut ordered = points.to_vec();
    ordered.sort_by_key(|(timestamp, _)| *timestamp);
    let values: Vec<f64> = ordered.iter().map(|(_, v)| *v).collect();

    let n = values.len();
    let nf = n as f64;
    let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();

    let sum_x: f64 = xs.iter().sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = xs.iter().zip(&values).map(|(x, y)| x * y).sum();
    let sum_x2: f64 = xs.iter().map(|x| x * x).sum();

    let denominator = nf * sum_x2 - sum_x * sum_x;
    let slope = if denominator == 0.0 { 0.0 } else { (nf * sum_xy - sum_x * sum_y) / denominator };
    let intercept = (sum_y - slope * sum_x) / nf;

    let mean_y = sum_y / nf;
    let ss_tot: f64 = values.iter().map(|y| (y - mean_y).powi(2)).sum();
    let ss_res: f64 = xs
        .iter()
        .zip(&values)
        .map(|(x, y)| (y - (slope * x + intercept)).powi(2))
        .sum();
    // A flat series is fit exactly by the horizontal line
    let r_squared = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };

    let volatility = if mean_y == 0.0 { 0.0 } else { population_std_dev(&values) / mean_y.abs() };

    let direction = if volatility > VOLATILITY_THRESHOLD {
        TrendDirection::Volatile
    } else if slope.abs() < STABLE_SLOPE_EPSILON {
        TrendDirection::Stable
    } else if slope > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };

    // Residual standard error; n >= 3 keeps the denominator positive
    let standard_error = (ss_res / (nf - 2.0)).sqrt();
    let forecast = (1..=FORECAST_STEPS)
        .map(|step| {
            let x = (n - 1 + step) as f64;
            let value = slope * x + intercept;
            ForecastPoint {
                step,
                value,
                lower: value - Z_95 * standard_error,
                upper: value + Z_95 * standard_error,
            }
        })
        .collect();

    Ok(TrendAnalysis {
        direction,
        slope,
        intercept,
        r_squared,
        volatility,
        confidence: r_squared,
        forecast,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn series(values: &[f64]) -> Vec<(DateTime<Utc>, f64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (Utc.timestamp_opt(1_700_000_000 + i as i64 * 60, 0).unwrap(), *v))
            .collect()
    }

    #[test]
    fn test_too_few_points_fails() {
        let err = analyze_trend(&series(&[0.5, 0.6])).unwrap_err();
        assert!(matches!(err, EvalError::InsufficientData(_)));
        assert!(err.to_string().contains("at least 3"));
    }

    #[test]
    fn test_strictly_increasing_series() {
        let analysis = analyze_trend(&series(&[0.5, 0.55, 0.6, 0.65, 0.7])).unwrap();
        assert_eq!(analysis.direction, TrendDirection::Increasing);
        assert!((analysis.slope - 0.05).abs() < 1e-9);
        assert!((analysis.r_squared - 1.0).abs() < 1e-9);
        assert_eq!(analysis.confidence, analysis.r_squared);
    }

    #[test]
    fn test_decreasing_series() {
        let analysis = analyze_trend(&series(&[0.9, 0.8, 0.7, 0.6])).unwrap();
        assert_eq!(analysis.direction, TrendDirection::Decreasing);
        assert!(analysis.slope < 0.0);
    }

    #[test]
    fn test_flat_series_is_stable() {
        let analysis = analyze_trend(&series(&[0.7, 0.7, 0.7, 0.7])).unwrap();
        assert_eq!(analysis.direction, TrendDirection::Stable);
        assert_eq!(analysis.slope, 0.0);
        assert_eq!(analysis.r_squared, 1.0);
        assert_eq!(analysis.volatility, 0.0);
    }

    #[test]
    fn test_volatile_series() {
        let analysis = analyze_trend(&series(&[0.1, 0.9, 0.05, 0.95, 0.1])).unwrap();
        assert_eq!(analysis.direction, TrendDirection::Volatile);
        assert!(analysis.volatility > VOLATILITY_THRESHOLD);
    }

    #[test]
    fn test_forecast_extends_fitted_line() {
        let analysis = analyze_trend(&series(&[0.1, 0.2, 0.3, 0.4])).unwrap();
        assert_eq!(analysis.forecast.len(), 5);
        // Perfect linear fit: next value continues the progression exactly
        assert!((analysis.forecast[0].value - 0.5).abs() < 1e-9);
        assert!((analysis.forecast[4].value - 0.9).abs() < 1e-9);
        for point in &analysis.forecast {
            assert!(point.lower <= point.value && point.value <= point.upper);
        }
    }

    #[test]
    fn test_unsorted_input_is_ordered_by_timestamp() {
        let mut pts = series(&[0.1, 0.2, 0.3, 0.4]);
        pts.swap(0, 3);
        let analysis = analyze_trend(&pts).unwrap();
        assert_eq!(analysis.direction, TrendDirection::Increasing);
        assert!((analysis.r_squared - 1.0).abs() < 1e-9);
    }
}
