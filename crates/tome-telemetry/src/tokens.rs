//! Token estimation under named encodings

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use thiserror::Error;
use tiktoken_rs::CoreBPE;

static CL100K: OnceLock<CoreBPE> = OnceLock::new();
static O200K: OnceLock<CoreBPE> = OnceLock::new();
static P50K: OnceLock<CoreBPE> = OnceLock::new();
static R50K: OnceLock<CoreBPE> = OnceLock::new();

/// Encoding used when nothing else is configured (the `gpt-3.5-turbo` encoding)
pub const DEFAULT_ENCODING: &str = "cl100k_base";

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("unknown encoding '{0}'")]
    Unknown(String),

    #[error("failed to load {encoding} tables: {message}")]
    Load { encoding: Encoding, message: String },
}

/// Named token encoding scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Cl100kBase,
    O200kBase,
    P50kBase,
    R50kBase,
    /// Content-aware chars-per-token approximation, no tables needed
    Heuristic,
    /// Whitespace-separated word count
    Words,
}

impl Encoding {
    pub const ALL: [Encoding; 6] = [
        Encoding::Cl100kBase,
        Encoding::O200kBase,
        Encoding::P50kBase,
        Encoding::R50kBase,
        Encoding::Heuristic,
        Encoding::Words,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Cl100kBase => "cl100k_base",
            Encoding::O200kBase => "o200k_base",
            Encoding::P50kBase => "p50k_base",
            Encoding::R50kBase => "r50k_base",
            Encoding::Heuristic => "heuristic",
            Encoding::Words => "words",
        }
    }

    /// Encoding a hosted model tokenizes with, when known
    pub fn for_model(model: &str) -> Option<Self> {
        match model {
            m if m.starts_with("gpt-4o") || m.starts_with("o1") || m.starts_with("o3") => {
                Some(Encoding::O200kBase)
            }
            m if m.starts_with("gpt-4") || m.starts_with("gpt-3.5-turbo") => {
                Some(Encoding::Cl100kBase)
            }
            m if m.starts_with("text-davinci") || m.starts_with("code-davinci") => {
                Some(Encoding::P50kBase)
            }
            "davinci" | "curie" | "babbage" | "ada" => Some(Encoding::R50kBase),
            _ => None,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Encoding::ALL
            .into_iter()
            .find(|e| e.name() == wanted)
            .or_else(|| Encoding::for_model(&wanted))
            .ok_or_else(|| EncodingError::Unknown(s.to_string()))
    }
}

/// Token cost function bound to one encoding.
///
/// Resolve it once at startup and reuse it for a whole summarization run:
/// different encodings count the same text differently, so mixing them inside
/// one run breaks the chunk budget. BPE tables are loaded once per process.
#[derive(Clone, Copy)]
pub struct TokenEstimator {
    encoding: Encoding,
    bpe: Option<&'static CoreBPE>,
}

impl TokenEstimator {
    /// Resolve an encoding (or model) name
    pub fn new(name: &str) -> Result<Self, EncodingError> {
        Self::for_encoding(name.parse()?)
    }

    pub fn for_encoding(encoding: Encoding) -> Result<Self, EncodingError> {
        let bpe = match encoding {
            Encoding::Cl100kBase => Some(load(&CL100K, encoding, tiktoken_rs::cl100k_base)?),
            Encoding::O200kBase => Some(load(&O200K, encoding, tiktoken_rs::o200k_base)?),
            Encoding::P50kBase => Some(load(&P50K, encoding, tiktoken_rs::p50k_base)?),
            Encoding::R50kBase => Some(load(&R50K, encoding, tiktoken_rs::r50k_base)?),
            Encoding::Heuristic | Encoding::Words => None,
        };
        Ok(Self { encoding, bpe })
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn estimate(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match (self.bpe, self.encoding) {
            (Some(bpe), _) => bpe.encode_with_special_tokens(text).len(),
            (None, Encoding::Words) => text.split_whitespace().count(),
            (None, _) => estimate_tokens(text),
        }
    }
}

impl fmt::Debug for TokenEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenEstimator")
            .field("encoding", &self.encoding)
            .finish()
    }
}

/// One-shot estimate under a named encoding
pub fn estimate(text: &str, encoding_name: &str) -> Result<usize, EncodingError> {
    Ok(TokenEstimator::new(encoding_name)?.estimate(text))
}

fn load<F, E>(
    cell: &'static OnceLock<CoreBPE>,
    encoding: Encoding,
    build: F,
) -> Result<&'static CoreBPE, EncodingError>
where
    F: FnOnce() -> Result<CoreBPE, E>,
    E: fmt::Display,
{
    if let Some(bpe) = cell.get() {
        return Ok(bpe);
    }
    let bpe = build().map_err(|e| EncodingError::Load {
        encoding,
        message: e.to_string(),
    })?;
    Ok(cell.get_or_init(|| bpe))
}

/// Estimate BPE token count from text
///
/// Heuristic estimation based on content type detection:
/// - Code-heavy content: ~2.5 chars/token
/// - Natural language: ~4.0 chars/token
/// - Markdown: ~3.0 chars/token
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }

    let total_chars = text.len();
    let total_lines = text.lines().count().max(1);

    let code_chars = text
        .chars()
        .filter(|&c| "{}[]();=<>|&!@#$%^*~`\\".contains(c))
        .count();

    let md_chars = text.chars().filter(|&c| "#-*_>".contains(c)).count();

    // Indented lines read as code
    let indent_lines = text
        .lines()
        .filter(|line| line.starts_with("    ") || line.starts_with('\t'))
        .count();
    let indent_ratio = indent_lines as f64 / total_lines as f64;

    let code_fraction =
        ((code_chars as f64 / total_chars as f64) * 10.0 + indent_ratio * 0.5).min(1.0);
    let md_fraction = ((md_chars as f64 / total_chars as f64) * 8.0).min(1.0 - code_fraction);
    let prose_fraction = 1.0 - code_fraction - md_fraction;

    let chars_per_token = code_fraction * 2.5 + md_fraction * 3.0 + prose_fraction * 4.0;

    (total_chars as f64 / chars_per_token).max(1.0) as usize
}
