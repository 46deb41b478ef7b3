mod common;

use common::{words, RecordingCaller};
use std::sync::Arc;
use tome_analysis::{
    AnalysisKind, Analyzer, Document, SummaryDb, ANALYSIS_SYSTEM_PROMPT, SUMMARY_SYSTEM_PROMPT,
};
use tome_core::{CancellationToken, RetryPolicy, Summarizer};

fn long_document() -> Document {
    let text = (0..30)
        .map(|i| format!("p{i} aa bb cc dd ee"))
        .collect::<Vec<_>>()
        .join("\n\n");
    Document::new("2701", "Moby Dick", text)
}

fn analyzer(caller: Arc<RecordingCaller>, db: SummaryDb) -> Analyzer {
    let summarizer = Summarizer::new(caller.clone(), words()).with_concurrency(1);
    Analyzer::new(summarizer, caller, RetryPolicy::default(), db).with_target_tokens(20)
}

#[tokio::test]
async fn test_analysis_summarizes_then_asks_once() {
    let caller = Arc::new(RecordingCaller::default());
    let analyzer = analyzer(caller.clone(), SummaryDb::in_memory().unwrap());
    let document = long_document();

    let outcome = analyzer
        .analyze(&document, AnalysisKind::Sentiment, false, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.result, "verdict");
    assert!(!outcome.summary.cached());
    let report = outcome.summary.report.unwrap();
    assert_eq!(report.iterations, 1);
    assert_eq!(report.model_calls, 10);
    assert_eq!(report.input_tokens, 180);
    assert_eq!(caller.calls(), 11);

    let seen = caller.seen.lock().unwrap().clone();
    assert_eq!(seen[0].0, SUMMARY_SYSTEM_PROMPT);
    assert_eq!(seen[0].1, "p0 aa bb cc dd ee\n\np1 aa bb cc dd ee\n\np2 aa bb cc dd ee");
    assert_eq!(seen[10].0, ANALYSIS_SYSTEM_PROMPT);
    assert!(seen[10]
        .1
        .starts_with("Analyze the sentiment of the following text:\n\nchunk gist\n\nchunk gist"));
}

#[tokio::test]
async fn test_stored_summary_reused_until_refresh() {
    let caller = Arc::new(RecordingCaller::default());
    let analyzer = analyzer(caller.clone(), SummaryDb::in_memory().unwrap());
    let document = long_document();
    let cancel = CancellationToken::new();

    analyzer
        .analyze(&document, AnalysisKind::Summary, false, &cancel)
        .await
        .unwrap();
    assert_eq!(caller.calls(), 11);

    let second = analyzer
        .analyze(&document, AnalysisKind::KeyCharacters, false, &cancel)
        .await
        .unwrap();
    assert!(second.summary.cached());
    assert_eq!(caller.calls(), 12);
    assert!(caller
        .last_user_prompt()
        .starts_with("Identify the key characters in the following text:"));

    let third = analyzer
        .analyze(&document, AnalysisKind::Custom, true, &cancel)
        .await
        .unwrap();
    assert!(!third.summary.cached());
    assert_eq!(caller.calls(), 23);

    let records = analyzer.db().analyses_for("2701").unwrap();
    let kinds: Vec<AnalysisKind> = records.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            AnalysisKind::Summary,
            AnalysisKind::KeyCharacters,
            AnalysisKind::Custom
        ]
    );
    assert!(records.iter().all(|r| r.provider == "recording"));
}

#[tokio::test]
async fn test_short_document_needs_no_chunk_calls() {
    let caller = Arc::new(RecordingCaller::default());
    let analyzer = analyzer(caller.clone(), SummaryDb::in_memory().unwrap());
    let document = Document::new("short", "Short", "A brief tale of one whale.");

    let summary = analyzer
        .summarize(&document, false, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.text, "A brief tale of one whale.");
    assert_eq!(caller.calls(), 0);

    let stored = analyzer.db().get_summary("short").unwrap().unwrap();
    assert_eq!(stored.summarized_text, "A brief tale of one whale.");
    assert_eq!(stored.encoding, "words");
    assert_eq!(stored.text_tokens, 6);
}

#[tokio::test]
async fn test_summary_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("summaries.db");
    let document = long_document();

    {
        let caller = Arc::new(RecordingCaller::default());
        let analyzer = analyzer(caller, SummaryDb::new(&db_path).unwrap());
        analyzer
            .summarize(&document, false, &CancellationToken::new())
            .await
            .unwrap();
    }

    let caller = Arc::new(RecordingCaller::default());
    let analyzer = analyzer(caller.clone(), SummaryDb::new(&db_path).unwrap());
    let summary = analyzer
        .summarize(&document, false, &CancellationToken::new())
        .await
        .unwrap();

    assert!(summary.cached());
    assert_eq!(caller.calls(), 0);
}

#[tokio::test]
async fn test_stored_summary_over_tighter_target_is_redone() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("summaries.db");
    let document = long_document();
    let cancel = CancellationToken::new();

    {
        let caller = Arc::new(RecordingCaller::default());
        let analyzer = analyzer(caller, SummaryDb::new(&db_path).unwrap());
        let first = analyzer.summarize(&document, false, &cancel).await.unwrap();
        assert_eq!(words().estimate(&first.text), 20);
    }

    let caller = Arc::new(RecordingCaller::default());
    let tight =
        analyzer(caller.clone(), SummaryDb::new(&db_path).unwrap()).with_target_tokens(4);
    let second = tight.summarize(&document, false, &cancel).await.unwrap();

    assert!(!second.cached());
    assert!(caller.calls() > 0);
    assert!(words().estimate(&second.text) <= 4);
    let stored = tight.db().get_summary("2701").unwrap().unwrap();
    assert_eq!(stored.summarized_text, second.text);

    // A looser target is served by the tighter stored text
    let calls_before = caller.calls();
    let loose = analyzer(caller.clone(), SummaryDb::new(&db_path).unwrap());
    let third = loose.summarize(&document, false, &cancel).await.unwrap();
    assert!(third.cached());
    assert_eq!(third.text, second.text);
    assert_eq!(caller.calls(), calls_before);
}
