//! Model caller capability consumed by the summarizer

use crate::error::CallError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Generation parameters for one call; `None` means provider default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallParams {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    /// Provider-specific extras (top_p, penalties, ...)
    #[serde(default)]
    pub options: BTreeMap<String, serde_json::Value>,
}

impl CallParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

/// Sends (system instruction, user content, parameters) to a language model.
///
/// Implementations must be reentrant: the summarizer shares one caller across
/// concurrent chunk calls.
#[async_trait]
pub trait ModelCaller: Send + Sync {
    /// Short provider name for logs and run records
    fn name(&self) -> &str;

    async fn call(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &CallParams,
    ) -> Result<String, CallError>;
}

#[async_trait]
impl<T: ModelCaller + ?Sized> ModelCaller for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn call(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &CallParams,
    ) -> Result<String, CallError> {
        (**self).call(system_prompt, user_prompt, params).await
    }
}
