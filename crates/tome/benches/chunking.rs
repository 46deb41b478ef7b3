use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use tome_core::{split_sentences, Chunker, TokenBudget};
use tome_telemetry::{Encoding, TokenEstimator};

fn synthetic_book(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|p| {
            (0..8)
                .map(|s| {
                    format!(
                        "Mr. Starbuck watched the sea for the {s}th time on day {p}, and the \
                         whale did not come."
                    )
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn bench_chunk_bpe_500_paragraphs(c: &mut Criterion) {
    let estimator = TokenEstimator::new("cl100k_base").unwrap();
    let chunker = Chunker::new(estimator, TokenBudget::new(5000).unwrap());
    let text = synthetic_book(500);

    c.bench_function("chunk_bpe_500_paragraphs", |b| {
        b.iter(|| chunker.chunk(black_box(&text)));
    });
}

fn bench_chunk_sentence_fallback(c: &mut Criterion) {
    let estimator = TokenEstimator::for_encoding(Encoding::Heuristic).unwrap();
    let chunker = Chunker::new(estimator, TokenBudget::new(40).unwrap());
    let text = synthetic_book(100);

    c.bench_function("chunk_sentence_fallback", |b| {
        b.iter(|| chunker.chunk(black_box(&text)));
    });
}

fn bench_split_sentences(c: &mut Criterion) {
    let text = synthetic_book(1);

    c.bench_function("split_sentences_paragraph", |b| {
        b.iter(|| split_sentences(black_box(&text)));
    });
}

criterion_group!(
    benches,
    bench_chunk_bpe_500_paragraphs,
    bench_chunk_sentence_fallback,
    bench_split_sentences
);
criterion_main!(benches);
