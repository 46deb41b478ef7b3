use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Text to summarize or analyze, keyed by a caller-chosen id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            text: text.into(),
        }
    }
}

/// Reduced text of a document as last stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSummary {
    pub document_id: String,
    pub title: String,
    pub text_tokens: i64,
    pub summarized_text: String,
    pub encoding: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Summary,
    Sentiment,
    KeyCharacters,
    Custom,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 4] = [
        AnalysisKind::Summary,
        AnalysisKind::Sentiment,
        AnalysisKind::KeyCharacters,
        AnalysisKind::Custom,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AnalysisKind::Summary => "summary",
            AnalysisKind::Sentiment => "sentiment",
            AnalysisKind::KeyCharacters => "key_characters",
            AnalysisKind::Custom => "custom",
        }
    }

    /// Final user prompt wrapping the reduced text
    pub fn prompt(&self, summarized_text: &str) -> String {
        let instruction = match self {
            AnalysisKind::Summary => "Provide a concise summary of the following text:",
            AnalysisKind::Sentiment => "Analyze the sentiment of the following text:",
            AnalysisKind::KeyCharacters => "Identify the key characters in the following text:",
            AnalysisKind::Custom => "Analyze the following text:",
        };
        format!("{instruction}\n\n{summarized_text}")
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognized kinds fall back to the general analysis
impl FromStr for AnalysisKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "summary" => AnalysisKind::Summary,
            "sentiment" => AnalysisKind::Sentiment,
            "key_characters" | "characters" => AnalysisKind::KeyCharacters,
            _ => AnalysisKind::Custom,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub document_id: String,
    pub kind: AnalysisKind,
    pub provider: String,
    pub result: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("summary".parse::<AnalysisKind>().unwrap(), AnalysisKind::Summary);
        assert_eq!(
            "key-characters".parse::<AnalysisKind>().unwrap(),
            AnalysisKind::KeyCharacters
        );
        assert_eq!("themes".parse::<AnalysisKind>().unwrap(), AnalysisKind::Custom);
        for kind in AnalysisKind::ALL {
            assert_eq!(kind.name().parse::<AnalysisKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_prompts() {
        assert_eq!(
            AnalysisKind::Sentiment.prompt("It was the best of times."),
            "Analyze the sentiment of the following text:\n\nIt was the best of times."
        );
        assert!(AnalysisKind::KeyCharacters
            .prompt("x")
            .starts_with("Identify the key characters"));
        assert!(AnalysisKind::Custom.prompt("x").starts_with("Analyze the following text:"));
    }

    #[test]
    fn test_kind_serde_is_snake_case() {
        assert_eq!(
            serde_json::to_string(&AnalysisKind::KeyCharacters).unwrap(),
            "\"key_characters\""
        );
    }
}
