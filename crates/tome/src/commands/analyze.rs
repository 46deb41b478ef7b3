use super::{cancel_on_ctrl_c, load_config, load_document, run_record, Pipeline, RunContext};
use crate::cli::{Overrides, SourceArgs};
use std::time::Instant;
use tome_analysis::AnalysisKind;
use tome_telemetry::{append_jsonl, Paths};
use tracing::{info, warn};

pub async fn run(source: &SourceArgs, kind: &str, overrides: &Overrides) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let config = load_config(&paths, overrides)?;
    let pipeline = Pipeline::open(&paths, &config)?;
    let document = load_document(&source.file, source.id.as_deref())?;
    let kind: AnalysisKind = kind.parse()?;
    let cancel = cancel_on_ctrl_c();

    let started = Instant::now();
    let summary = pipeline
        .analyzer
        .summarize(&document, source.refresh, &cancel)
        .await;

    let record = run_record(
        &RunContext {
            document: &document,
            provider: &pipeline.provider,
            estimator: pipeline.estimator,
            target_tokens: config.summarizer.target_tokens,
            elapsed: started.elapsed(),
        },
        &summary,
    );
    if let Err(e) = append_jsonl(&paths.runs_file(), &record) {
        warn!(error = %e, "failed to record run");
    }
    summary?;

    // The summary is stored now, so this reuses it
    let outcome = pipeline
        .analyzer
        .analyze(&document, kind, false, &cancel)
        .await?;

    info!(document = %document.id, kind = %outcome.kind, "analysis complete");
    println!("{}", outcome.result);
    Ok(())
}
