//! Recursive summarization core: chunking, retries and reduction

mod caller;
mod chunker;
mod config;
mod error;
mod retry;
mod sentences;
mod summarizer;
mod types;

pub use caller::{CallParams, ModelCaller};
pub use chunker::{merge_adjacent, Chunker};
pub use config::{
    Config, ProviderConfig, ProviderKind, RetryConfig, SummarizerConfig, ENV_CONCURRENCY,
    ENV_ENCODING, ENV_LLM_TOKEN, ENV_LLM_TYPE,
};
pub use error::{CallError, ConfigError, RetryError, SummarizeError};
pub use retry::{log_backoff, RetryAttempt, RetryPolicy};
pub use sentences::{split_paragraphs, split_sentences};
pub use summarizer::{
    Summarizer, DEFAULT_CHUNK_OUTPUT_TOKENS, DEFAULT_CONCURRENCY, DEFAULT_MAX_ITERATIONS,
};
pub use types::{Chunk, Phase, ReductionState, SummaryReport, TokenBudget};

pub use tokio_util::sync::CancellationToken;
