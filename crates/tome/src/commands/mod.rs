pub mod analyze;
pub mod chunk;
pub mod estimate;
pub mod history;
pub mod init;
pub mod summarize;
pub mod version;

use crate::cli::Overrides;
use anyhow::Context;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tome_analysis::{
    build_caller, AnalysisError, Analyzer, Document, SummaryDb, SummaryOutcome,
};
use tome_core::{
    CancellationToken, Config, RetryError, RetryPolicy, SummarizeError, Summarizer,
};
use tome_telemetry::{Paths, RunOutcome, RunRecord, TokenEstimator};

/// Defaults, then config.json, then TOME_* variables, then flags
pub fn load_config(paths: &Paths, overrides: &Overrides) -> anyhow::Result<Config> {
    let mut config = Config::load(&paths.config_file())?;
    config.apply_env()?;

    if let Some(provider) = &overrides.provider {
        config.provider.kind = provider.parse()?;
    }
    if let Some(model) = &overrides.model {
        config.provider.model = Some(model.clone());
    }
    if let Some(encoding) = &overrides.encoding {
        config.summarizer.encoding = encoding.clone();
    }
    if let Some(concurrency) = overrides.concurrency {
        config.summarizer.concurrency = concurrency;
    }
    Ok(config)
}

pub fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Explicit id, else the file stem, else "stdin"
pub fn load_document(path: &Path, id: Option<&str>) -> anyhow::Result<Document> {
    let text = read_input(path)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| s != "-")
        .unwrap_or_else(|| "stdin".to_string());
    let id = id.map(str::to_string).unwrap_or_else(|| stem.clone());
    Ok(Document::new(id, stem, text))
}

/// Summarizer and analyzer wired from one validated config
pub struct Pipeline {
    pub summarizer: Summarizer,
    pub analyzer: Analyzer,
    pub estimator: TokenEstimator,
    pub provider: String,
}

impl Pipeline {
    pub fn open(paths: &Paths, config: &Config) -> anyhow::Result<Self> {
        let estimator = config.validate()?;
        let caller = build_caller(&config.provider)?;
        let provider = caller.name().to_string();

        std::fs::create_dir_all(&paths.home)
            .with_context(|| format!("failed to create {}", paths.home.display()))?;
        let db = SummaryDb::new(&paths.summaries_db())?;

        let summarizer = Summarizer::from_config(caller.clone(), estimator, config);
        let analyzer = Analyzer::new(
            Summarizer::from_config(caller.clone(), estimator, config),
            caller,
            RetryPolicy::from(&config.retry),
            db,
        )
        .with_target_tokens(config.summarizer.target_tokens);

        Ok(Self {
            summarizer,
            analyzer,
            estimator,
            provider,
        })
    }
}

/// Token cancelled on the first Ctrl-C
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            trigger.cancel();
        }
    });
    token
}

fn is_cancelled(err: &AnalysisError) -> bool {
    matches!(
        err,
        AnalysisError::Summarize(SummarizeError::Cancelled)
            | AnalysisError::Call(RetryError::Cancelled)
    )
}

pub struct RunContext<'a> {
    pub document: &'a Document,
    pub provider: &'a str,
    pub estimator: TokenEstimator,
    pub target_tokens: usize,
    pub elapsed: Duration,
}

/// Describe one summarization attempt for runs.jsonl
pub fn run_record(
    ctx: &RunContext<'_>,
    result: &Result<SummaryOutcome, AnalysisError>,
) -> RunRecord {
    let now = chrono::Utc::now();
    let mut record = RunRecord {
        run_id: format!("run_{:x}", now.timestamp_nanos_opt().unwrap_or_default()),
        document_id: ctx.document.id.clone(),
        timestamp: now,
        provider: ctx.provider.to_string(),
        encoding: ctx.estimator.encoding().name().to_string(),
        target_tokens: ctx.target_tokens,
        input_tokens: 0,
        output_tokens: 0,
        outcome: RunOutcome::Failed,
        iterations: 0,
        model_calls: 0,
        failed_chunks: 0,
        elapsed_ms: ctx.elapsed.as_millis() as u64,
        error: None,
    };

    match result {
        Ok(outcome) => {
            record.output_tokens = ctx.estimator.estimate(&outcome.text);
            match &outcome.report {
                Some(report) => {
                    record.input_tokens = report.input_tokens;
                    record.iterations = report.iterations;
                    record.model_calls = report.model_calls;
                    record.failed_chunks = report.failed_chunks;
                    record.outcome = if report.iterations == 0 {
                        RunOutcome::Unchanged
                    } else {
                        RunOutcome::Reduced
                    };
                }
                None => {
                    record.input_tokens = ctx.estimator.estimate(&ctx.document.text);
                    record.outcome = RunOutcome::Cached;
                }
            }
        }
        Err(err) => {
            record.input_tokens = ctx.estimator.estimate(&ctx.document.text);
            record.outcome = if is_cancelled(err) {
                RunOutcome::Cancelled
            } else {
                RunOutcome::Failed
            };
            record.error = Some(err.to_string());
        }
    }
    record
}
