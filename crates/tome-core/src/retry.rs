//! Bounded retries with exponential backoff for model calls

use crate::config::RetryConfig;
use crate::error::{CallError, RetryError};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Backoff taken after attempt `index` (0-based) failed with `cause`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryAttempt {
    pub index: u32,
    pub delay: Duration,
    pub cause: Option<CallError>,
}

/// Retry wrapper with no knowledge of the operation it drives.
///
/// Attempt `i` failing with a rate limit waits `base_delay * 2^i` units, even
/// after the last attempt, and the policy then gives up with
/// [`RetryError::Exhausted`]. Any other failure waits `2^i` units, except on the
/// last attempt where it is returned as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: u32,
    pub unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: 2,
            unit: Duration::from_secs(1),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_delay,
            unit: Duration::from_millis(config.unit_ms),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: u32, unit: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            unit,
        }
    }

    pub fn delay_for(&self, cause: &CallError, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let units = if cause.is_rate_limited() {
            self.base_delay.saturating_mul(factor)
        } else {
            factor
        };
        self.unit.saturating_mul(units)
    }

    /// Run `operation` under this policy, logging each backoff
    pub async fn call<T, F, Fut>(&self, operation: F) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CallError>>,
    {
        self.call_with(operation, &CancellationToken::new(), log_backoff)
            .await
    }

    /// Run `operation`, reporting every backoff to `observe` and abandoning
    /// the in-flight attempt or sleep as soon as `cancel` fires
    pub async fn call_with<T, F, Fut, O>(
        &self,
        mut operation: F,
        cancel: &CancellationToken,
        mut observe: O,
    ) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CallError>>,
        O: FnMut(&RetryAttempt),
    {
        let attempts = self.max_retries.max(1);
        let mut last = None;

        for attempt in 0..attempts {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                outcome = operation() => outcome,
            };
            let cause = match outcome {
                Ok(value) => return Ok(value),
                Err(cause) => cause,
            };

            if !cause.is_rate_limited() && attempt + 1 == attempts {
                return Err(RetryError::Call(cause));
            }

            let delay = self.delay_for(&cause, attempt);
            observe(&RetryAttempt {
                index: attempt,
                delay,
                cause: Some(cause.clone()),
            });
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            last = Some(cause);
        }

        Err(RetryError::Exhausted {
            attempts,
            last: last.unwrap_or_else(|| CallError::Transient("no attempt made".to_string())),
        })
    }
}

/// Default observer: one `warn!` per backoff
pub fn log_backoff(attempt: &RetryAttempt) {
    match &attempt.cause {
        Some(cause) if cause.is_rate_limited() => warn!(
            attempt = attempt.index + 1,
            delay_ms = attempt.delay.as_millis() as u64,
            "rate limit hit, backing off"
        ),
        Some(cause) => warn!(
            attempt = attempt.index + 1,
            delay_ms = attempt.delay.as_millis() as u64,
            error = %cause,
            "model call failed, retrying"
        ),
        None => {}
    }
}
