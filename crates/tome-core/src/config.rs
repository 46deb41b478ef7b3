//! Configuration for summarization runs

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tome_telemetry::{TokenEstimator, DEFAULT_ENCODING};

pub const ENV_LLM_TYPE: &str = "TOME_LLM_TYPE";
pub const ENV_LLM_TOKEN: &str = "TOME_LLM_TOKEN";
pub const ENV_ENCODING: &str = "TOME_ENCODING";
pub const ENV_CONCURRENCY: &str = "TOME_CONCURRENCY";

/// Language-model provider family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    Groq,
    Samba,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Groq => "groq",
            ProviderKind::Samba => "samba",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "groq" => Ok(ProviderKind::Groq),
            "samba" | "sambanova" => Ok(ProviderKind::Samba),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// Backoff settings for model calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per call, including the first
    pub max_retries: u32,

    /// Rate-limit backoff multiplier (delay = base_delay * 2^attempt units)
    pub base_delay: u32,

    /// Length of one backoff unit in milliseconds
    pub unit_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: 2,
            unit_ms: 1000,
        }
    }
}

/// Recursive reduction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Token ceiling of the final text
    pub target_tokens: usize,

    /// Output budget requested for each chunk summary
    pub chunk_output_tokens: u32,

    /// Reductions attempted before giving up on convergence
    pub max_iterations: usize,

    /// Chunk calls allowed in flight at once
    pub concurrency: usize,

    /// Encoding name used for every estimate in a run
    pub encoding: String,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            target_tokens: 5000,
            chunk_output_tokens: 500,
            max_iterations: 10,
            concurrency: 4,
            encoding: DEFAULT_ENCODING.to_string(),
        }
    }
}

/// Which remote model to call and how to authenticate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    /// Overrides the provider's default model
    pub model: Option<String>,
    /// Overrides the provider's default endpoint
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::OpenAi,
            api_key: None,
            model: None,
            base_url: None,
            timeout_secs: 120,
        }
    }
}

/// Top-level configuration (config.json)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub summarizer: SummarizerConfig,
    pub retry: RetryConfig,
    pub provider: ProviderConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        tome_telemetry::atomic_write(path, json.as_bytes()).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Apply TOME_* variables from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(kind) = lookup(ENV_LLM_TYPE) {
            self.provider.kind = kind.parse()?;
        }
        if let Some(token) = lookup(ENV_LLM_TOKEN) {
            self.provider.api_key = Some(token);
        }
        if let Some(encoding) = lookup(ENV_ENCODING) {
            self.summarizer.encoding = encoding;
        }
        if let Some(concurrency) = lookup(ENV_CONCURRENCY) {
            self.summarizer.concurrency =
                concurrency
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: ENV_CONCURRENCY.to_string(),
                        value: concurrency.clone(),
                    })?;
        }
        Ok(())
    }

    /// Check invariants and resolve the encoding once, at startup
    pub fn validate(&self) -> Result<TokenEstimator, ConfigError> {
        let positive = [
            ("summarizer.target_tokens", self.summarizer.target_tokens),
            ("summarizer.concurrency", self.summarizer.concurrency),
            ("summarizer.max_iterations", self.summarizer.max_iterations),
            ("retry.max_retries", self.retry.max_retries as usize),
        ];
        if let Some((key, value)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
            });
        }
        Ok(TokenEstimator::new(&self.summarizer.encoding)?)
    }
}
