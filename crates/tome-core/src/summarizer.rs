//! Recursive summarization: chunk, summarize, recombine until the text fits

use crate::caller::{CallParams, ModelCaller};
use crate::chunker::{merge_adjacent, Chunker};
use crate::config::Config;
use crate::error::{RetryError, SummarizeError};
use crate::retry::{log_backoff, RetryPolicy};
use crate::types::{Chunk, Phase, ReductionState, SummaryReport, TokenBudget};
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tome_telemetry::TokenEstimator;
use tracing::{debug, info, warn};

pub const DEFAULT_CHUNK_OUTPUT_TOKENS: u32 = 500;
pub const DEFAULT_MAX_ITERATIONS: usize = 10;
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Reduces text of any size to a target token budget through a model caller.
///
/// Each reduction chunks the text at the target, summarizes every chunk with
/// an output cap of `chunk_output_tokens` and joins the summaries with blank
/// lines. A chunk that still fails after retries contributes nothing; if every
/// chunk of a reduction fails the request fails. Reductions stop at
/// `max_iterations`.
pub struct Summarizer {
    caller: Arc<dyn ModelCaller>,
    estimator: TokenEstimator,
    retry: RetryPolicy,
    params: CallParams,
    chunk_output_tokens: u32,
    max_iterations: usize,
    concurrency: usize,
}

impl Summarizer {
    pub fn new(caller: Arc<dyn ModelCaller>, estimator: TokenEstimator) -> Self {
        Self {
            caller,
            estimator,
            retry: RetryPolicy::default(),
            params: CallParams::default(),
            chunk_output_tokens: DEFAULT_CHUNK_OUTPUT_TOKENS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn from_config(
        caller: Arc<dyn ModelCaller>,
        estimator: TokenEstimator,
        config: &Config,
    ) -> Self {
        Self::new(caller, estimator)
            .with_retry(RetryPolicy::from(&config.retry))
            .with_chunk_output_tokens(config.summarizer.chunk_output_tokens)
            .with_max_iterations(config.summarizer.max_iterations)
            .with_concurrency(config.summarizer.concurrency)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Base parameters for chunk calls; the output cap is always overridden
    pub fn with_params(mut self, params: CallParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_chunk_output_tokens(mut self, tokens: u32) -> Self {
        self.chunk_output_tokens = tokens;
        self
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations.max(1);
        self
    }

    /// Chunk calls in flight per reduction; 1 processes chunks sequentially
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn estimator(&self) -> &TokenEstimator {
        &self.estimator
    }

    pub fn caller_name(&self) -> &str {
        self.caller.name()
    }

    pub async fn summarize(
        &self,
        text: &str,
        system_prompt: &str,
        target_tokens: usize,
    ) -> Result<String, SummarizeError> {
        let (summary, _) = self
            .summarize_with_report(text, system_prompt, target_tokens, &CancellationToken::new())
            .await?;
        Ok(summary)
    }

    /// Summarize, abandoning the current reduction when `cancel` fires
    pub async fn summarize_with_report(
        &self,
        text: &str,
        system_prompt: &str,
        target_tokens: usize,
        cancel: &CancellationToken,
    ) -> Result<(String, SummaryReport), SummarizeError> {
        let target = TokenBudget::new(target_tokens)?;
        let chunker = Chunker::new(self.estimator, target);
        let mut state = ReductionState::new(text.to_string(), target);
        let mut report = SummaryReport {
            input_tokens: self.estimator.estimate(text),
            ..SummaryReport::default()
        };

        loop {
            let tokens = self.estimator.estimate(&state.text);
            if target.admits(tokens) {
                state.advance(Phase::Done);
                report.iterations = state.iteration;
                report.output_tokens = tokens;
                info!(
                    iterations = report.iterations,
                    input_tokens = report.input_tokens,
                    output_tokens = tokens,
                    "summarization complete"
                );
                return Ok((state.text, report));
            }
            if state.iteration >= self.max_iterations {
                return Err(SummarizeError::ConvergenceFailure {
                    iterations: state.iteration,
                    tokens,
                    target: target.get(),
                });
            }

            state.iteration += 1;
            info!(
                iteration = state.iteration,
                tokens,
                target = target.get(),
                "text over budget, reducing"
            );

            state.advance(Phase::Chunking);
            let chunks = chunker.chunk(&state.text);
            let produced = chunks.len();
            let combined = merge_adjacent(chunks, &self.estimator, target);
            debug!(
                chunks = produced,
                combined = combined.len(),
                "chunked for reduction"
            );

            state.advance(Phase::SummarizingChunks);
            let (outcomes, attempts) = self
                .summarize_chunks(&combined, system_prompt, cancel, state.iteration)
                .await?;
            report.model_calls += attempts;

            state.advance(Phase::Recombining);
            let mut summaries = Vec::with_capacity(outcomes.len());
            let mut last_failure = None;
            for outcome in outcomes {
                match outcome {
                    Ok(summary) => summaries.push(summary),
                    Err(e) => {
                        report.failed_chunks += 1;
                        last_failure = Some(e);
                    }
                }
            }
            if summaries.is_empty() {
                if let Some(last) = last_failure {
                    return Err(SummarizeError::AllChunksFailed {
                        iteration: state.iteration,
                        chunks: combined.len(),
                        last,
                    });
                }
            }

            state.text = summaries
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n");
            state.advance(Phase::Sizing);
        }
    }

    /// One reduction's chunk calls, at most `concurrency` in flight, results
    /// in chunk order, plus the number of attempts made including retries.
    /// Returns only once every call has settled.
    async fn summarize_chunks(
        &self,
        chunks: &[Chunk],
        system_prompt: &str,
        cancel: &CancellationToken,
        iteration: usize,
    ) -> Result<(Vec<Result<String, RetryError>>, usize), SummarizeError> {
        let params = self
            .params
            .clone()
            .max_output_tokens(self.chunk_output_tokens);
        let params = &params;
        let attempts = AtomicUsize::new(0);
        let attempts = &attempts;
        let total = chunks.len();

        let calls = stream::iter(chunks.iter().enumerate())
            .map(move |(index, chunk)| async move {
                debug!(
                    iteration,
                    chunk = index + 1,
                    total,
                    tokens = chunk.tokens,
                    "summarizing chunk"
                );
                let result = self
                    .retry
                    .call_with(
                        move || {
                            attempts.fetch_add(1, Ordering::Relaxed);
                            self.caller.call(system_prompt, &chunk.text, params)
                        },
                        cancel,
                        log_backoff,
                    )
                    .await;
                if let Err(e) = &result {
                    if *e != RetryError::Cancelled {
                        warn!(iteration, chunk = index + 1, error = %e, "chunk summary failed, omitting");
                    }
                }
                result
            })
            .buffered(self.concurrency)
            .collect::<Vec<_>>();

        let outcomes = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SummarizeError::Cancelled),
            outcomes = calls => outcomes,
        };
        if outcomes
            .iter()
            .any(|o| matches!(o, Err(RetryError::Cancelled)))
        {
            return Err(SummarizeError::Cancelled);
        }
        Ok((outcomes, attempts.load(Ordering::Relaxed)))
    }
}
