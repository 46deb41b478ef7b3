use super::{load_config, read_input};
use crate::cli::Overrides;
use std::path::Path;
use tome_core::split_paragraphs;
use tome_telemetry::{Paths, TokenEstimator};

struct Estimate {
    tokens: usize,
    chars: usize,
    words: usize,
    paragraphs: usize,
}

fn measure(text: &str, estimator: &TokenEstimator) -> Estimate {
    Estimate {
        tokens: estimator.estimate(text),
        chars: text.chars().count(),
        words: text.split_whitespace().count(),
        paragraphs: split_paragraphs(text).len(),
    }
}

pub fn run(file: &Path, overrides: &Overrides) -> anyhow::Result<()> {
    let config = load_config(&Paths::new()?, overrides)?;
    let estimator = TokenEstimator::new(&config.summarizer.encoding)?;
    let text = read_input(file)?;

    let estimate = measure(&text, &estimator);
    println!("Encoding:   {}", estimator.encoding());
    println!("Tokens:     {}", estimate.tokens);
    println!("Characters: {}", estimate.chars);
    println!("Words:      {}", estimate.words);
    println!("Paragraphs: {}", estimate.paragraphs);

    let target = config.summarizer.target_tokens;
    if estimate.tokens > target {
        println!(
            "\nExceeds the {} token target by {} tokens",
            target,
            estimate.tokens - target
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tome_telemetry::Encoding;

    #[test]
    fn test_measure_words() {
        let estimator = TokenEstimator::for_encoding(Encoding::Words).unwrap();
        let estimate = measure("Call me Ishmael.\n\nSome years ago.", &estimator);
        assert_eq!(estimate.tokens, 6);
        assert_eq!(estimate.words, 6);
        assert_eq!(estimate.paragraphs, 2);
        assert_eq!(estimate.chars, 33);
    }

    #[test]
    fn test_measure_empty() {
        let estimator = TokenEstimator::for_encoding(Encoding::Heuristic).unwrap();
        let estimate = measure("", &estimator);
        assert_eq!(estimate.tokens, 0);
        assert_eq!(estimate.paragraphs, 0);
    }
}
