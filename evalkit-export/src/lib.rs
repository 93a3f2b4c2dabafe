//! # evalkit-export
//!
//! Stable serialization of Evalkit results and reports.
//!
//! JSON goes through serde and round-trips losslessly. CSV uses a fixed
//! column order (`score,passed,feedback` plus optional
//! `evaluation_type,execution_time,timestamp` columns) with RFC4180-style
//! double-quote escaping, so downstream spreadsheets and scripts can rely
//! on the layout.

pub mod csv;
pub mod json;

// Re-exports
pub use csv::{records_to_csv, results_to_csv, CsvRecord};
pub use json::{report_to_json, results_from_json, results_to_json};
