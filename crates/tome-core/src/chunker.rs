//! Token-budgeted chunking: paragraphs first, sentences for oversized paragraphs

use crate::sentences::{split_paragraphs, split_sentences};
use crate::types::{Chunk, TokenBudget};
use tome_telemetry::TokenEstimator;
use tracing::debug;

const PARAGRAPH_JOIN: &str = "\n\n";
const SENTENCE_JOIN: &str = " ";

/// How a packable unit attaches to the one before it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Join {
    /// First unit of a new paragraph
    Paragraph,
    /// Later sentence of a paragraph that was split
    Sentence,
}

#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    estimator: TokenEstimator,
    max_tokens: TokenBudget,
}

impl Chunker {
    pub fn new(estimator: TokenEstimator, max_tokens: TokenBudget) -> Self {
        Self {
            estimator,
            max_tokens,
        }
    }

    /// Split `text` into ordered chunks of at most `max_tokens` each.
    ///
    /// A sentence that alone exceeds the budget is emitted whole with
    /// `over_budget` set.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let max = self.max_tokens.get();
        let mut packer = Packer::new(self.estimator, max);

        for paragraph in split_paragraphs(text) {
            let cost = self.estimator.estimate(paragraph);
            if cost <= max {
                packer.push(paragraph, cost, Join::Paragraph);
                continue;
            }

            debug!(tokens = cost, max, "paragraph over budget, packing sentences");
            for (i, sentence) in split_sentences(paragraph).into_iter().enumerate() {
                let join = if i == 0 { Join::Paragraph } else { Join::Sentence };
                packer.push(sentence, self.estimator.estimate(sentence), join);
            }
        }

        packer.finish()
    }
}

/// Greedy accumulator shared by the paragraph and sentence paths
struct Packer {
    estimator: TokenEstimator,
    max: usize,
    paragraph_join_cost: usize,
    sentence_join_cost: usize,
    buffer: String,
    running: usize,
    chunks: Vec<Chunk>,
}

impl Packer {
    fn new(estimator: TokenEstimator, max: usize) -> Self {
        Self {
            estimator,
            max,
            paragraph_join_cost: estimator.estimate(PARAGRAPH_JOIN),
            sentence_join_cost: estimator.estimate(SENTENCE_JOIN),
            buffer: String::new(),
            running: 0,
            chunks: Vec::new(),
        }
    }

    fn push(&mut self, unit: &str, cost: usize, join: Join) {
        let (joiner, join_cost) = match join {
            Join::Paragraph => (PARAGRAPH_JOIN, self.paragraph_join_cost),
            Join::Sentence => (SENTENCE_JOIN, self.sentence_join_cost),
        };

        if !self.buffer.is_empty() && self.running + join_cost + cost <= self.max {
            self.buffer.push_str(joiner);
            self.buffer.push_str(unit);
            self.running += join_cost + cost;
            return;
        }

        self.flush();
        self.buffer.push_str(unit);
        self.running = cost;
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.buffer);
        let tokens = self.estimator.estimate(&text);
        let over_budget = tokens > self.max;
        if over_budget {
            debug!(tokens, max = self.max, "emitting unsplittable sentence over budget");
        }
        self.chunks.push(Chunk {
            text,
            tokens,
            over_budget,
        });
        self.running = 0;
    }

    fn finish(mut self) -> Vec<Chunk> {
        self.flush();
        self.chunks
    }
}

/// Merge adjacent chunks while the merged text still fits `budget`.
///
/// Sentence-level packing leaves chunks well under the budget; this second
/// pass fills them back up before any model call is spent.
pub fn merge_adjacent(
    chunks: Vec<Chunk>,
    estimator: &TokenEstimator,
    budget: TokenBudget,
) -> Vec<Chunk> {
    let mut merged: Vec<Chunk> = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        if let Some(last) = merged.last_mut() {
            let candidate = format!("{}{}{}", last.text, PARAGRAPH_JOIN, chunk.text);
            let tokens = estimator.estimate(&candidate);
            if budget.admits(tokens) {
                last.text = candidate;
                last.tokens = tokens;
                continue;
            }
        }
        merged.push(chunk);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use tome_telemetry::Encoding;

    fn words() -> TokenEstimator {
        TokenEstimator::for_encoding(Encoding::Words).unwrap()
    }

    fn chunker(max: usize) -> Chunker {
        Chunker::new(words(), TokenBudget::new(max).unwrap())
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(chunker(10).chunk("").is_empty());
        assert!(chunker(10).chunk(" \n\n \n").is_empty());
    }

    #[test]
    fn test_paragraphs_pack_greedily() {
        let text = "one two three\n\nfour five\n\nsix seven eight nine ten eleven";
        let chunks = chunker(10).chunk(text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "one two three\n\nfour five");
        assert_eq!(chunks[0].tokens, 5);
        assert_eq!(chunks[1].text, "six seven eight nine ten eleven");
        assert!(chunks.iter().all(|c| !c.over_budget));
    }

    #[test]
    fn test_sentences_of_one_paragraph_join_with_space() {
        let text = "Aa bb cc. Dd ee. Ff gg hh ii jj kk.";
        let chunks = chunker(5).chunk(text);

        assert_eq!(chunks[0].text, "Aa bb cc. Dd ee.");
        assert_eq!(chunks[0].tokens, 5);
        assert_eq!(chunks[1].text, "Ff gg hh ii jj kk.");
        assert!(chunks[1].over_budget);
    }

    #[test]
    fn test_paragraph_after_sentences_joins_with_blank_line() {
        let text = "Aa bb cc dd ee. Ff gg hh ii.\n\nJj kk.";
        let chunks = chunker(8).chunk(text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "Aa bb cc dd ee.");
        assert_eq!(chunks[1].text, "Ff gg hh ii.\n\nJj kk.");
    }

    #[test]
    fn test_oversized_sentence_passes_through_whole() {
        let text = "one two three four five six.";
        let chunks = chunker(3).chunk(text);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].tokens, 6);
        assert!(chunks[0].over_budget);
    }

    #[test]
    fn test_unbroken_text_is_one_paragraph() {
        let text = "First sentence here. Second sentence here. Third one.";
        let chunks = chunker(100).chunk(text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);

        let split = chunker(4).chunk(text);
        assert_eq!(split.len(), 3);
        assert_eq!(split[2].text, "Third one.");
    }

    #[test]
    fn test_merge_adjacent_fills_budget() {
        let estimator = words();
        let chunk = |text: &str| Chunk {
            text: text.to_string(),
            tokens: estimator.estimate(text),
            over_budget: false,
        };
        let chunks = vec![
            chunk("a b c"),
            chunk("d e f"),
            chunk("g h i"),
            chunk("j k l m n"),
        ];

        let merged = merge_adjacent(chunks, &estimator, TokenBudget::new(8).unwrap());

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text, "a b c\n\nd e f");
        assert_eq!(merged[0].tokens, 6);
        assert_eq!(merged[1].text, "g h i\n\nj k l m n");
        assert_eq!(merged[1].tokens, 8);
    }

    #[test]
    fn test_merge_keeps_oversized_chunk_alone() {
        let estimator = words();
        let chunks = vec![
            Chunk {
                text: "a b c d e f g h i j".to_string(),
                tokens: 10,
                over_budget: true,
            },
            Chunk {
                text: "k".to_string(),
                tokens: 1,
                over_budget: false,
            },
        ];
        let merged = merge_adjacent(chunks, &estimator, TokenBudget::new(5).unwrap());
        assert_eq!(merged.len(), 2);
    }
}
