//! Bounded, append-only log of past evaluation outcomes

use evalkit_core::EvalResult;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

/// Default maximum number of retained entries
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// One recorded evaluation outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Name the evaluation ran under ("comprehensive" for composites)
    pub evaluator: String,
    /// The recorded outcome
    pub result: EvalResult,
}

/// Aggregate view over the retained history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_evaluations: usize,
    pub average_score: f64,
    pub pass_rate: f64,
    /// How many retained entries each evaluator produced
    pub evaluator_usage: HashMap<String, usize>,
}

/// Append-only evaluation log, bounded by evicting the oldest entries.
///
/// Writers are serialized through an internal lock; reads take snapshots.
pub struct EvalHistory {
    entries: RwLock<VecDeque<HistoryEntry>>,
    capacity: usize,
}

impl EvalHistory {
    /// Create a history retaining at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self { entries: RwLock::new(VecDeque::new()), capacity: capacity.max(1) }
    }

    /// Append an outcome, evicting the oldest entry once full
    pub fn record(&self, evaluator: &str, result: EvalResult) {
        let mut entries = self.entries.write().unwrap();
        entries.push_back(HistoryEntry { evaluator: evaluator.to_string(), result });
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// The most recent entries, oldest first; `None` returns everything
    pub fn recent(&self, limit: Option<usize>) -> Vec<HistoryEntry> {
        let entries = self.entries.read().unwrap();
        let skip = limit.map_or(0, |l| entries.len().saturating_sub(l));
        entries.iter().skip(skip).cloned().collect()
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Whether the history is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every retained entry
    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    /// Aggregate statistics over the retained entries
    pub fn statistics(&self) -> HistoryStats {
        let entries = self.entries.read().unwrap();
        let total = entries.len();
        if total == 0 {
            return HistoryStats::default();
        }

        let mut usage: HashMap<String, usize> = HashMap::new();
        let mut score_sum = 0.0;
        let mut pass_count = 0usize;
        for entry in entries.iter() {
            *usage.entry(entry.evaluator.clone()).or_insert(0) += 1;
            score_sum += entry.result.score;
            if entry.result.passed {
                pass_count += 1;
            }
        }

        HistoryStats {
            total_evaluations: total,
            average_score: score_sum / total as f64,
            pass_rate: pass_count as f64 / total as f64,
            evaluator_usage: usage,
        }
    }
}

impl Default for EvalHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
