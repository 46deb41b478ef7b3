use thiserror::Error;
use tome_telemetry::EncodingError;

/// Classified failure of one model call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("model call failed: {0}")]
    Transient(String),
}

impl CallError {
    /// HTTP 429, or a message mentioning 429 / "rate limit", is throttling
    pub fn classify(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        if status == Some(429) || lowered.contains("429") || lowered.contains("rate limit") {
            CallError::RateLimited(message)
        } else {
            CallError::Transient(message)
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CallError::RateLimited(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetryError {
    /// Every attempt was consumed without a final re-raise
    #[error("max retries exceeded after {attempts} attempts (last: {last})")]
    Exhausted { attempts: u32, last: CallError },

    /// The remote rejected the final attempt
    #[error(transparent)]
    Call(CallError),

    #[error("retry cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("target budget must be at least one token")]
    ZeroBudget,

    #[error("all {chunks} chunks failed in reduction {iteration}: {last}")]
    AllChunksFailed {
        iteration: usize,
        chunks: usize,
        last: RetryError,
    },

    #[error("no convergence after {iterations} reductions: {tokens} tokens remain, target {target}")]
    ConvergenceFailure {
        iterations: usize,
        tokens: usize,
        target: usize,
    },

    #[error("summarization cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown provider '{0}' (expected openai, groq or samba)")]
    UnknownProvider(String),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}
