//! CSV export with a fixed column order
//!
//! Columns are always `score,passed,feedback`, extended with
//! `evaluation_type,execution_time,timestamp` when records carry them.
//! Feedback is quoted RFC4180-style: wrapped in double quotes whenever it
//! contains a comma, quote or newline, with embedded quotes doubled.

use chrono::{DateTime, Utc};
use evalkit_core::EvalResult;

/// One CSV row, optionally annotated with run context
#[derive(Debug, Clone)]
pub struct CsvRecord {
    pub score: f64,
    pub passed: bool,
    pub feedback: String,
    /// Which evaluation produced the row (evaluator or suite name)
    pub evaluation_type: Option<String>,
    /// Seconds the evaluation took
    pub execution_time: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl From<&EvalResult> for CsvRecord {
    fn from(result: &EvalResult) -> Self {
        Self {
            score: result.score,
            passed: result.passed,
            feedback: result.feedback.clone().unwrap_or_default(),
            evaluation_type: None,
            execution_time: None,
            timestamp: Some(result.timestamp),
        }
    }
}

impl CsvRecord {
    /// Annotate with the evaluation type column
    pub fn with_evaluation_type(mut self, evaluation_type: impl Into<String>) -> Self {
        self.evaluation_type = Some(evaluation_type.into());
        self
    }

    /// Annotate with the execution time column
    pub fn with_execution_time(mut self, seconds: f64) -> Self {
        self.execution_time = Some(seconds);
        self
    }
}

/// Render records with the full optional column set.
///
/// An optional column appears whenever any record carries a value for it;
/// records without one emit an empty field.
pub fn records_to_csv(records: &[CsvRecord]) -> String {
    let has_type = records.iter().any(|r| r.evaluation_type.is_some());
    let has_time = records.iter().any(|r| r.execution_time.is_some());
    let has_timestamp = records.iter().any(|r| r.timestamp.is_some());

    let mut out = String::from("score,passed,feedback");
    if has_type {
        out.push_str(",evaluation_type");
    }
    if has_time {
        out.push_str(",execution_time");
    }
    if has_timestamp {
        out.push_str(",timestamp");
    }
    out.push('\n');

    for record in records {
        out.push_str(&format!("{},{},{}", record.score, record.passed, escape(&record.feedback)));
        if has_type {
            out.push(',');
            if let Some(evaluation_type) = &record.evaluation_type {
                out.push_str(&escape(evaluation_type));
            }
        }
        if has_time {
            out.push(',');
            if let Some(seconds) = record.execution_time {
                out.push_str(&seconds.to_string());
            }
        }
        if has_timestamp {
            out.push(',');
            if let Some(timestamp) = record.timestamp {
                out.push_str(&timestamp.to_rfc3339());
            }
        }
        out.push('\n');
    }
    out
}

/// Render plain results; `include_timestamp` adds the timestamp column
pub fn results_to_csv(results: &[EvalResult], include_timestamp: bool) -> String {
    let records: Vec<CsvRecord> = results
        .iter()
        .map(|result| {
            let mut record = CsvRecord::from(result);
            if !include_timestamp {
                record.timestamp = None;
            }
            record
        })
        .collect();
    records_to_csv(&records)
}

/// Quote a field RFC4180-style when it needs it
fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
