use super::{load_config, read_input};
use crate::cli::Overrides;
use std::path::Path;
use tome_core::{Chunk, Chunker, TokenBudget};
use tome_telemetry::{Paths, TokenEstimator};

const PREVIEW_CHARS: usize = 72;

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", cut)
}

fn render(chunks: &[Chunk], max_tokens: usize) -> String {
    let mut out = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        let flag = if chunk.over_budget { " OVER" } else { "" };
        out.push_str(&format!(
            "  #{:<4} {:>6} tokens{} | {}\n",
            i,
            chunk.tokens,
            flag,
            preview(&chunk.text)
        ));
    }
    let total: usize = chunks.iter().map(|c| c.tokens).sum();
    let over = chunks.iter().filter(|c| c.over_budget).count();
    out.push_str(&format!(
        "\n{} chunks, {} tokens, budget {} per chunk, {} over budget",
        chunks.len(),
        total,
        max_tokens,
        over
    ));
    out
}

pub fn run(
    file: &Path,
    max_tokens: usize,
    json: bool,
    overrides: &Overrides,
) -> anyhow::Result<()> {
    let config = load_config(&Paths::new()?, overrides)?;
    let estimator = TokenEstimator::new(&config.summarizer.encoding)?;
    let budget = TokenBudget::new(max_tokens)?;
    let text = read_input(file)?;

    let chunks = Chunker::new(estimator, budget).chunk(&text);

    if json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
    } else {
        println!("{}", render(&chunks, max_tokens));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tome_telemetry::Encoding;

    #[test]
    fn test_preview_truncates() {
        let long = "word ".repeat(40);
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 3);
        assert_eq!(preview("a\n\nb"), "a b");
    }

    #[test]
    fn test_render_marks_over_budget() {
        let estimator = TokenEstimator::for_encoding(Encoding::Words).unwrap();
        let chunks = Chunker::new(estimator, TokenBudget::new(3).unwrap())
            .chunk("one two\n\nthree four five six seven.");

        let out = render(&chunks, 3);
        assert!(out.contains("OVER"));
        assert!(out.contains("2 chunks, 7 tokens, budget 3 per chunk, 1 over budget"));
    }
}
