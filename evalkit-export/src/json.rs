//! JSON export and import

use evalkit_core::{EvalReport, EvalResult, Result};

/// Serialize results to JSON; `pretty` controls indentation
pub fn results_to_json(results: &[EvalResult], pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(results)?
    } else {
        serde_json::to_string(results)?
    };
    Ok(json)
}

/// Restore results previously produced by [`results_to_json`]
pub fn results_from_json(json: &str) -> Result<Vec<EvalResult>> {
    Ok(serde_json::from_str(json)?)
}

/// Serialize a full report to JSON
pub fn report_to_json(report: &EvalReport, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    Ok(json)
}
