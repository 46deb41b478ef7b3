//! Run record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a summarization run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Text already fit the target, no model calls
    Unchanged,
    Reduced,
    /// Served from the summary store
    Cached,
    Failed,
    Cancelled,
}

/// One summarization run, appended to runs.jsonl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub document_id: String,
    pub timestamp: DateTime<Utc>,
    pub provider: String,
    pub encoding: String,
    pub target_tokens: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub outcome: RunOutcome,
    #[serde(default)]
    pub iterations: usize,
    #[serde(default)]
    pub model_calls: usize,
    #[serde(default)]
    pub failed_chunks: usize,
    #[serde(default)]
    pub elapsed_ms: u64,
    #[serde(default)]
    pub error: Option<String>,
}

impl RunRecord {
    /// Fraction of input tokens removed by the run
    pub fn reduction_ratio(&self) -> f64 {
        if self.input_tokens == 0 {
            return 0.0;
        }
        1.0 - self.output_tokens as f64 / self.input_tokens as f64
    }
}
