use thiserror::Error;
use tome_core::{ProviderKind, RetryError, SummarizeError};

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("no API key configured for {0} (set TOME_LLM_TOKEN or provider.api_key)")]
    MissingApiKey(ProviderKind),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid stored timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Summarize(#[from] SummarizeError),

    #[error("analysis call failed: {0}")]
    Call(#[from] RetryError),
}
