//! Literary analyses on top of the recursive summarizer

use crate::error::AnalysisError;
use crate::storage::SummaryDb;
use crate::types::{AnalysisKind, AnalysisRecord, Document, StoredSummary};
use chrono::Utc;
use std::sync::Arc;
use tome_core::{
    log_backoff, CallParams, CancellationToken, ModelCaller, RetryPolicy, SummaryReport,
    Summarizer,
};
use tracing::info;

/// Target budget of the reduced text an analysis reads
pub const ANALYSIS_TARGET_TOKENS: usize = 5000;

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful and expert assistant in literary \
analysis. You can summarize texts, determine sentiment, and identify key characters. Respond \
concisely and accurately.";

pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are a helpful and expert assistant in literary \
analysis. You can summarize texts, determine sentiment, and identify key characters. Respond \
concisely and accurately. Make sure not to include any introductory phrases such as \
\"Here is a summary\" or \"The following is a summary.\"";

/// Reduced text for a document, fresh or from the store
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    pub text: String,
    /// `None` when the stored summary was reused
    pub report: Option<SummaryReport>,
}

impl SummaryOutcome {
    pub fn cached(&self) -> bool {
        self.report.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub kind: AnalysisKind,
    pub result: String,
    pub summary: SummaryOutcome,
}

/// Summarizes documents once, stores the reduced text and answers analyses
/// from it
pub struct Analyzer {
    summarizer: Summarizer,
    caller: Arc<dyn ModelCaller>,
    retry: RetryPolicy,
    db: SummaryDb,
    target_tokens: usize,
}

impl Analyzer {
    pub fn new(
        summarizer: Summarizer,
        caller: Arc<dyn ModelCaller>,
        retry: RetryPolicy,
        db: SummaryDb,
    ) -> Self {
        Self {
            summarizer,
            caller,
            retry,
            db,
            target_tokens: ANALYSIS_TARGET_TOKENS,
        }
    }

    pub fn with_target_tokens(mut self, target_tokens: usize) -> Self {
        self.target_tokens = target_tokens;
        self
    }

    pub fn db(&self) -> &SummaryDb {
        &self.db
    }

    /// Reduced text of `document`, reusing the stored one unless `refresh`,
    /// it was produced under another encoding, or it exceeds the current
    /// target
    pub async fn summarize(
        &self,
        document: &Document,
        refresh: bool,
        cancel: &CancellationToken,
    ) -> Result<SummaryOutcome, AnalysisError> {
        let estimator = self.summarizer.estimator();
        let encoding = estimator.encoding().name();

        if !refresh {
            if let Some(stored) = self.db.get_summary(&document.id)? {
                let tokens = estimator.estimate(&stored.summarized_text);
                if stored.encoding == encoding && tokens <= self.target_tokens {
                    info!(document = %document.id, tokens, "reusing stored summary");
                    return Ok(SummaryOutcome {
                        text: stored.summarized_text,
                        report: None,
                    });
                }
                if stored.encoding == encoding {
                    info!(
                        document = %document.id,
                        tokens,
                        target = self.target_tokens,
                        "stored summary over target, summarizing again"
                    );
                }
            }
        }

        info!(document = %document.id, target = self.target_tokens, "summarizing document");
        let (text, report) = self
            .summarizer
            .summarize_with_report(&document.text, SUMMARY_SYSTEM_PROMPT, self.target_tokens, cancel)
            .await?;

        self.db.upsert_summary(&StoredSummary {
            document_id: document.id.clone(),
            title: document.title.clone(),
            text_tokens: report.input_tokens as i64,
            summarized_text: text.clone(),
            encoding: encoding.to_string(),
            updated_at: Utc::now(),
        })?;

        Ok(SummaryOutcome {
            text,
            report: Some(report),
        })
    }

    pub async fn analyze(
        &self,
        document: &Document,
        kind: AnalysisKind,
        refresh: bool,
        cancel: &CancellationToken,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let summary = self.summarize(document, refresh, cancel).await?;
        let user_prompt = kind.prompt(&summary.text);
        let user_prompt = user_prompt.as_str();
        let params = &CallParams::new();

        let result = self
            .retry
            .call_with(
                move || self.caller.call(ANALYSIS_SYSTEM_PROMPT, user_prompt, params),
                cancel,
                log_backoff,
            )
            .await?;

        self.db.insert_analysis(&AnalysisRecord {
            document_id: document.id.clone(),
            kind,
            provider: self.caller.name().to_string(),
            result: result.clone(),
            created_at: Utc::now(),
        })?;
        info!(document = %document.id, kind = %kind, "analysis stored");

        Ok(AnalysisOutcome {
            kind,
            result,
            summary,
        })
    }
}
