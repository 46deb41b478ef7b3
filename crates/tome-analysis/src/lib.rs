//! Model providers, summary storage and literary analyses

mod analysis;
mod error;
pub mod provider;
mod storage;
mod types;

pub use analysis::{
    AnalysisOutcome, Analyzer, SummaryOutcome, ANALYSIS_SYSTEM_PROMPT, ANALYSIS_TARGET_TOKENS,
    SUMMARY_SYSTEM_PROMPT,
};
pub use error::{AnalysisError, ProviderError, StorageError};
pub use provider::{build_caller, OpenAiCompatibleCaller};
pub use storage::SummaryDb;
pub use types::{AnalysisKind, AnalysisRecord, Document, StoredSummary};
