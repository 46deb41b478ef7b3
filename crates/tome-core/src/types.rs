//! Core types for chunking and reduction

use crate::error::SummarizeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Positive token ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct TokenBudget(usize);

impl TokenBudget {
    pub fn new(tokens: usize) -> Result<Self, SummarizeError> {
        if tokens == 0 {
            return Err(SummarizeError::ZeroBudget);
        }
        Ok(Self(tokens))
    }

    pub fn get(self) -> usize {
        self.0
    }

    pub fn admits(self, tokens: usize) -> bool {
        tokens <= self.0
    }
}

impl TryFrom<usize> for TokenBudget {
    type Error = SummarizeError;

    fn try_from(tokens: usize) -> Result<Self, Self::Error> {
        Self::new(tokens)
    }
}

impl From<TokenBudget> for usize {
    fn from(budget: TokenBudget) -> usize {
        budget.0
    }
}

impl fmt::Display for TokenBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} tokens", self.0)
    }
}

/// Contiguous trimmed span of the input, costed when emitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub tokens: usize,
    /// Set only when a single sentence alone exceeds the budget
    #[serde(default)]
    pub over_budget: bool,
}

/// Reduction state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Sizing,
    Chunking,
    SummarizingChunks,
    Recombining,
    Done,
}

impl Phase {
    pub fn can_transition_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Sizing, Phase::Chunking)
                | (Phase::Sizing, Phase::Done)
                | (Phase::Chunking, Phase::SummarizingChunks)
                | (Phase::SummarizingChunks, Phase::Recombining)
                | (Phase::Recombining, Phase::Sizing)
        )
    }
}

/// Working state of one summarize call
#[derive(Debug)]
pub struct ReductionState {
    pub text: String,
    pub target: TokenBudget,
    pub iteration: usize,
    pub phase: Phase,
}

impl ReductionState {
    pub fn new(text: String, target: TokenBudget) -> Self {
        Self {
            text,
            target,
            iteration: 0,
            phase: Phase::Sizing,
        }
    }

    pub fn advance(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.phase,
            next
        );
        tracing::debug!(iteration = self.iteration, from = ?self.phase, to = ?next, "phase");
        self.phase = next;
    }
}

/// Counters describing one completed summarization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub iterations: usize,
    /// Requests sent to the model, retried attempts included
    pub model_calls: usize,
    pub failed_chunks: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
}
