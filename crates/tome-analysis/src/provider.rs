//! Chat-completions callers for OpenAI-compatible endpoints

use crate::error::ProviderError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tome_core::{CallError, CallParams, ModelCaller, ProviderConfig, ProviderKind};
use tracing::{debug, error, info};

/// Output budget used when neither the call nor the provider sets one
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 100;

#[derive(Debug, Clone)]
pub struct ProviderDefaults {
    pub model: &'static str,
    pub base_url: &'static str,
    pub params: CallParams,
}

pub fn provider_defaults(kind: ProviderKind) -> ProviderDefaults {
    match kind {
        ProviderKind::OpenAi => ProviderDefaults {
            model: "gpt-3.5-turbo",
            base_url: "https://api.openai.com/v1",
            params: CallParams::new()
                .temperature(0.7)
                .max_output_tokens(DEFAULT_MAX_OUTPUT_TOKENS)
                .option("top_p", json!(1.0))
                .option("frequency_penalty", json!(0.0))
                .option("presence_penalty", json!(0.0)),
        },
        ProviderKind::Groq => ProviderDefaults {
            model: "llama3-8b-8192",
            base_url: "https://api.groq.com/openai/v1",
            params: CallParams::new().max_output_tokens(DEFAULT_MAX_OUTPUT_TOKENS),
        },
        ProviderKind::Samba => ProviderDefaults {
            model: "Meta-Llama-3.1-8B-Instruct",
            base_url: "https://api.sambanova.ai/v1",
            params: CallParams::new().max_output_tokens(DEFAULT_MAX_OUTPUT_TOKENS),
        },
    }
}

/// One system message plus one user message, answered with the trimmed text
/// of the first choice. HTTP 429 maps to [`CallError::RateLimited`].
pub struct OpenAiCompatibleCaller {
    client: Client,
    kind: ProviderKind,
    endpoint: String,
    api_key: String,
    model: String,
    defaults: CallParams,
}

impl OpenAiCompatibleCaller {
    pub fn new(kind: ProviderKind, api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::from_config(&ProviderConfig {
            kind,
            api_key: Some(api_key.into()),
            ..ProviderConfig::default()
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ProviderError::MissingApiKey(config.kind))?;
        let defaults = provider_defaults(config.kind);
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(defaults.base_url)
            .trim_end_matches('/');

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            kind: config.kind,
            endpoint: format!("{base_url}/chat/completions"),
            api_key,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| defaults.model.to_string()),
            defaults: defaults.params,
        })
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_body(&self, system_prompt: &str, user_prompt: &str, params: &CallParams) -> Value {
        let model = params.model.as_deref().unwrap_or(&self.model);
        let max_tokens = params
            .max_output_tokens
            .or(self.defaults.max_output_tokens)
            .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS);

        let mut body = json!({
            "model": model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
            "max_tokens": max_tokens,
        });

        if let Some(temperature) = params.temperature.or(self.defaults.temperature) {
            body["temperature"] = json!(temperature);
        }
        for (key, value) in self.defaults.options.iter().chain(params.options.iter()) {
            body[key.as_str()] = value.clone();
        }
        body
    }
}

#[async_trait]
impl ModelCaller for OpenAiCompatibleCaller {
    fn name(&self) -> &str {
        self.kind.name()
    }

    async fn call(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &CallParams,
    ) -> Result<String, CallError> {
        let body = self.build_body(system_prompt, user_prompt, params);
        debug!(
            provider = self.name(),
            model = body["model"].as_str().unwrap_or_default(),
            max_tokens = body["max_tokens"].as_u64().unwrap_or_default(),
            "sending chat completion"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CallError::classify(e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(
                provider = self.name(),
                status = status.as_u16(),
                "chat completion rejected"
            );
            return Err(CallError::classify(
                Some(status.as_u16()),
                format!("{} API error {status}: {detail}", self.name()),
            ));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| CallError::Transient(format!("invalid response body: {e}")))?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| CallError::Transient("response has no message content".to_string()))?;

        Ok(content.trim().to_string())
    }
}

/// Resolve the configured provider into the caller shared by a whole run
pub fn build_caller(config: &ProviderConfig) -> Result<Arc<dyn ModelCaller>, ProviderError> {
    let caller = OpenAiCompatibleCaller::from_config(config)?;
    info!(
        provider = caller.name(),
        model = caller.model(),
        "model caller ready"
    );
    Ok(Arc::new(caller))
}
