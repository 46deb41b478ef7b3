use super::{cancel_on_ctrl_c, load_config, load_document, run_record, Pipeline, RunContext};
use crate::cli::{Overrides, SummarizeArgs};
use std::time::Instant;
use tome_analysis::{AnalysisError, SummaryOutcome};
use tome_telemetry::{append_jsonl, Paths};
use tracing::{info, warn};

pub async fn run(args: &SummarizeArgs, overrides: &Overrides) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let mut config = load_config(&paths, overrides)?;
    if let Some(target) = args.target {
        config.summarizer.target_tokens = target;
    }
    let pipeline = Pipeline::open(&paths, &config)?;
    let document = load_document(&args.source.file, args.source.id.as_deref())?;
    let cancel = cancel_on_ctrl_c();
    let target = config.summarizer.target_tokens;

    let started = Instant::now();
    let result: Result<SummaryOutcome, AnalysisError> = match &args.prompt {
        Some(prompt) => pipeline
            .summarizer
            .summarize_with_report(&document.text, prompt, target, &cancel)
            .await
            .map(|(text, report)| SummaryOutcome {
                text,
                report: Some(report),
            })
            .map_err(AnalysisError::from),
        None => {
            pipeline
                .analyzer
                .summarize(&document, args.source.refresh, &cancel)
                .await
        }
    };

    let record = run_record(
        &RunContext {
            document: &document,
            provider: &pipeline.provider,
            estimator: pipeline.estimator,
            target_tokens: target,
            elapsed: started.elapsed(),
        },
        &result,
    );
    if let Err(e) = append_jsonl(&paths.runs_file(), &record) {
        warn!(error = %e, "failed to record run");
    }

    let outcome = result?;
    info!(
        document = %document.id,
        input = record.input_tokens,
        output = record.output_tokens,
        calls = record.model_calls,
        cached = outcome.cached(),
        "summary ready"
    );
    println!("{}", outcome.text);
    Ok(())
}
