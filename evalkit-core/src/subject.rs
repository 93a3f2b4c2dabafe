//! Evaluation subjects and the diagnostic detail bag

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A diagnostic value attached to subjects and results.
///
/// Deliberately a closed set of kinds rather than arbitrary JSON, so
/// consumers such as the statistics engine's metric extraction stay
/// type-safe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailValue {
    /// Numeric diagnostic (scores, latencies, counts)
    Number(f64),
    /// Boolean flag
    Flag(bool),
    /// Free-form text
    Text(String),
    /// Nested map of further details
    Map(BTreeMap<String, DetailValue>),
}

impl DetailValue {
    /// Numeric view, if this value is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            DetailValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean view, if this value is a flag
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            DetailValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// Text view, if this value is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DetailValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for DetailValue {
    fn from(value: f64) -> Self {
        DetailValue::Number(value)
    }
}

impl From<bool> for DetailValue {
    fn from(value: bool) -> Self {
        DetailValue::Flag(value)
    }
}

impl From<&str> for DetailValue {
    fn from(value: &str) -> Self {
        DetailValue::Text(value.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(value: String) -> Self {
        DetailValue::Text(value)
    }
}

/// The thing being judged: an input/output pair plus free-form metadata.
///
/// The engine imposes no schema here; concrete evaluators narrow the bag
/// to whatever their criteria need.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subject {
    /// Prompt or task given to the system under evaluation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    /// Output produced by the system under evaluation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Reference output, when one exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,

    /// Arbitrary diagnostic metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, DetailValue>,

    /// Environment the output was produced in (model name, runtime, ...)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub environment: HashMap<String, String>,
}

impl Subject {
    /// Create a subject from an input/output pair
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self { input: Some(input.into()), output: Some(output.into()), ..Default::default() }
    }

    /// Attach a reference output
    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// Attach one metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<DetailValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attach one environment entry
    pub fn with_environment(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_builder() {
        let subject = Subject::new("What is Rust?", "A systems language.")
            .with_expected("Rust is a systems programming language.")
            .with_metadata("latency_ms", 120.0)
            .with_environment("model", "gpt-4o");

        assert_eq!(subject.input.as_deref(), Some("What is Rust?"));
        assert_eq!(subject.metadata.get("latency_ms").and_then(DetailValue::as_number), Some(120.0));
        assert_eq!(subject.environment.get("model").map(String::as_str), Some("gpt-4o"));
    }

    #[test]
    fn test_detail_value_views() {
        assert_eq!(DetailValue::from(0.5).as_number(), Some(0.5));
        assert_eq!(DetailValue::from(true).as_flag(), Some(true));
        assert_eq!(DetailValue::from("note").as_text(), Some("note"));
        assert_eq!(DetailValue::from("note").as_number(), None);
    }

    #[test]
    fn test_detail_value_roundtrip() {
        let mut nested = BTreeMap::new();
        nested.insert("tokens".to_string(), DetailValue::Number(42.0));
        let value = DetailValue::Map(nested);

        let json = serde_json::to_string(&value).unwrap();
        let back: DetailValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
