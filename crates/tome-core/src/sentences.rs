//! Paragraph and sentence segmentation

use regex::Regex;
use std::sync::OnceLock;

static PARAGRAPH_RE: OnceLock<Regex> = OnceLock::new();
static SENTENCE_END_RE: OnceLock<Regex> = OnceLock::new();

/// Words that end in a period without ending the sentence
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "messrs", "dr", "st", "jr", "sr", "prof", "rev", "hon", "gen", "col",
    "capt", "lt", "sgt", "mt", "vs", "etc", "e.g", "i.e", "cf", "viz", "vol", "fig", "ave",
    "inc", "ltd",
];

/// Split on blank lines, trimming each paragraph and dropping empty ones
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    let re = PARAGRAPH_RE.get_or_init(|| Regex::new(r"\n\s*\n").unwrap());
    re.split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split a paragraph into trimmed sentences.
///
/// A run of `.`, `!`, `?` or `…` (plus closing quotes or brackets) followed by
/// whitespace ends a sentence unless the next word starts lowercase, or a lone
/// period follows an abbreviation or a single-letter initial.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let re = SENTENCE_END_RE
        .get_or_init(|| Regex::new(r#"[.!?…]+["'”’)\]]*\s+"#).unwrap());

    let mut sentences = Vec::new();
    let mut start = 0;
    for m in re.find_iter(text) {
        let terminator = m.as_str().trim_end();
        if !ends_sentence(&text[start..m.start()], terminator, &text[m.end()..]) {
            continue;
        }
        push_trimmed(&mut sentences, &text[start..m.start() + terminator.len()]);
        start = m.end();
    }
    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, span: &'a str) {
    let span = span.trim();
    if !span.is_empty() {
        out.push(span);
    }
}

fn ends_sentence(before: &str, terminator: &str, rest: &str) -> bool {
    if rest.chars().next().is_some_and(char::is_lowercase) {
        return false;
    }
    if terminator != "." {
        return true;
    }

    let word = before
        .rsplit(|c: char| c.is_whitespace() || c == '(' || c == '"')
        .next()
        .unwrap_or("");
    let lowered = word.to_lowercase();
    if ABBREVIATIONS.contains(&lowered.as_str()) {
        return false;
    }

    let mut chars = word.chars();
    !matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        let text = "  First paragraph.\nStill first.\n\n\n\nSecond.\n   \nThird.  ";
        assert_eq!(
            split_paragraphs(text),
            vec!["First paragraph.\nStill first.", "Second.", "Third."]
        );
        assert!(split_paragraphs("\n\n  \n\n").is_empty());
    }

    #[test]
    fn test_basic_sentences() {
        let text = "Hello world. This is fine!  Is it?\nYes.";
        assert_eq!(
            split_sentences(text),
            vec!["Hello world.", "This is fine!", "Is it?", "Yes."]
        );
    }

    #[test]
    fn test_abbreviations_do_not_split() {
        let text = "Mr. Darcy bowed. Mrs. Bennet, e.g. the mother, beamed. Dr. Watson agreed.";
        assert_eq!(
            split_sentences(text),
            vec![
                "Mr. Darcy bowed.",
                "Mrs. Bennet, e.g. the mother, beamed.",
                "Dr. Watson agreed."
            ]
        );
    }

    #[test]
    fn test_initials_do_not_split() {
        let text = "J. R. R. Tolkien wrote it. It sold well.";
        assert_eq!(
            split_sentences(text),
            vec!["J. R. R. Tolkien wrote it.", "It sold well."]
        );
    }

    #[test]
    fn test_quoted_exclamation_followed_by_lowercase() {
        let text = "\"Stop!\" she cried. Then silence fell.";
        assert_eq!(
            split_sentences(text),
            vec!["\"Stop!\" she cried.", "Then silence fell."]
        );
    }

    #[test]
    fn test_closing_quote_kept_with_sentence() {
        let text = "He said \"Go.\" They went.";
        assert_eq!(split_sentences(text), vec!["He said \"Go.\"", "They went."]);
    }

    #[test]
    fn test_no_terminator_is_one_sentence() {
        assert_eq!(split_sentences("no breaks here"), vec!["no breaks here"]);
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn test_only_whitespace_is_lost() {
        let text = "One.  Two!\n Three?   Four";
        let rebuilt: String = split_sentences(text).concat();
        let original: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        assert_eq!(rebuilt.replace(' ', ""), original);
    }
}
