use tome_telemetry::{read_jsonl, Paths, RunOutcome, RunRecord};

#[derive(Default)]
struct HistoryFilter {
    document: Option<String>,
    hours: Option<u64>,
    limit: Option<usize>,
}

fn filter_runs<'a>(runs: &'a [RunRecord], filter: &HistoryFilter) -> Vec<&'a RunRecord> {
    let cutoff = filter
        .hours
        .map(|h| chrono::Utc::now() - chrono::Duration::hours(h as i64));

    runs.iter()
        .filter(|r| {
            if let Some(ref cutoff) = cutoff {
                if r.timestamp < *cutoff {
                    return false;
                }
            }
            if let Some(ref document) = filter.document {
                if &r.document_id != document {
                    return false;
                }
            }
            true
        })
        .collect()
}

fn compute_stats(runs: &[RunRecord]) -> String {
    if runs.is_empty() {
        return "No runs to analyze.".to_string();
    }
    let total = runs.len();
    let count = |outcome: RunOutcome| runs.iter().filter(|r| r.outcome == outcome).count();

    let reduced: Vec<&RunRecord> = runs
        .iter()
        .filter(|r| r.outcome == RunOutcome::Reduced)
        .collect();
    let avg_reduction = if reduced.is_empty() {
        0.0
    } else {
        reduced.iter().map(|r| r.reduction_ratio()).sum::<f64>() / reduced.len() as f64
    };
    let total_calls: usize = runs.iter().map(|r| r.model_calls).sum();
    let failed_chunks: usize = runs.iter().map(|r| r.failed_chunks).sum();

    format!(
        "Total runs: {}\n\
         Reduced: {} | Unchanged: {} | Cached: {} | Failed: {} | Cancelled: {}\n\
         Avg reduction: {:.1}%\n\
         Model calls: {}\n\
         Failed chunks: {}",
        total,
        count(RunOutcome::Reduced),
        count(RunOutcome::Unchanged),
        count(RunOutcome::Cached),
        count(RunOutcome::Failed),
        count(RunOutcome::Cancelled),
        avg_reduction * 100.0,
        total_calls,
        failed_chunks
    )
}

fn outcome_label(outcome: RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::Unchanged => "unchanged",
        RunOutcome::Reduced => "reduced",
        RunOutcome::Cached => "cached",
        RunOutcome::Failed => "failed",
        RunOutcome::Cancelled => "cancelled",
    }
}

pub fn run(stats: bool, limit: usize) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let runs: Vec<RunRecord> = read_jsonl(&paths.runs_file())?;

    if runs.is_empty() {
        println!("No run history");
        return Ok(());
    }

    if stats {
        println!("{}", compute_stats(&runs));
        return Ok(());
    }

    let filter = HistoryFilter {
        limit: Some(limit),
        ..Default::default()
    };

    let filtered = filter_runs(&runs, &filter);
    let display_runs: Vec<_> = filtered
        .into_iter()
        .rev()
        .take(filter.limit.unwrap_or(20))
        .collect();

    println!("Recent Runs (last {})", display_runs.len());
    println!("=====================");
    for run in &display_runs {
        println!(
            "  {} | {} | {} -> {} tokens (target {}) | {} calls | {:.1}s | {}",
            run.timestamp.format("%Y-%m-%d %H:%M"),
            run.document_id,
            run.input_tokens,
            run.output_tokens,
            run.target_tokens,
            run.model_calls,
            run.elapsed_ms as f64 / 1000.0,
            outcome_label(run.outcome),
        );
        if let Some(ref error) = run.error {
            println!("      {}", error);
        }
    }
    Ok(())
}
