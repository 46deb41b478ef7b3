#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tome_core::{CallError, CallParams, ModelCaller, RetryPolicy};
use tome_telemetry::{Encoding, TokenEstimator};

pub fn words() -> TokenEstimator {
    TokenEstimator::for_encoding(Encoding::Words).unwrap()
}

/// Retry policy with millisecond units so real-time tests stay fast
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, 2, Duration::from_millis(1))
}

/// Paragraph of `n` sentences, each "<tag>N one two three."
pub fn paragraph(tag: &str, sentences: usize) -> String {
    (0..sentences)
        .map(|i| format!("{tag}{i} one two three."))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Caller answering every chunk through `respond`, recording each user prompt
pub struct ScriptedCaller<F> {
    respond: F,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl<F> ScriptedCaller<F>
where
    F: Fn(&str) -> Result<String, CallError> + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl<F> ModelCaller for ScriptedCaller<F>
where
    F: Fn(&str) -> Result<String, CallError> + Send + Sync,
{
    fn name(&self) -> &str {
        "scripted"
    }

    async fn call(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _params: &CallParams,
    ) -> Result<String, CallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(user_prompt.to_string());
        (self.respond)(user_prompt)
    }
}

/// Always answers with the same placeholder
pub fn fixed(summary: &'static str) -> ScriptedCaller<impl Fn(&str) -> Result<String, CallError>> {
    ScriptedCaller::new(move |_: &str| Ok(summary.to_string()))
}

/// Sleeps longer for earlier chunks so completions arrive out of order, and
/// tracks how many calls overlap
pub struct SlowCaller {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl SlowCaller {
    pub fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelCaller for SlowCaller {
    fn name(&self) -> &str {
        "slow"
    }

    async fn call(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _params: &CallParams,
    ) -> Result<String, CallError> {
        let seq = self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(100 - 10 * (seq as u64 % 10))).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let first_word = user_prompt.split_whitespace().next().unwrap_or("");
        Ok(first_word.to_string())
    }
}
