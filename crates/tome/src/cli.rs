use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tome")]
#[command(version)]
#[command(about = "Recursive summarization of book-length text")]
pub struct Cli {
    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings that take precedence over config.json and the environment
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Model provider (openai, groq, samba)
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Model name sent to the provider
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Token encoding (cl100k_base, o200k_base, words, ...)
    #[arg(long, global = true)]
    pub encoding: Option<String>,

    /// Chunk calls allowed in flight at once
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config.json
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Count the tokens of a text file
    Estimate {
        /// Input file, or - for stdin
        file: PathBuf,
    },

    /// Show how a text file splits under a token budget
    Chunk {
        /// Input file, or - for stdin
        file: PathBuf,

        /// Token ceiling per chunk
        #[arg(short, long)]
        max_tokens: usize,

        /// Print chunks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reduce a text file to a token budget
    Summarize(SummarizeArgs),

    /// Run a literary analysis on a text file
    Analyze {
        #[command(flatten)]
        source: SourceArgs,

        /// summary, sentiment, key_characters or custom
        #[arg(short, long, default_value = "summary")]
        kind: String,
    },

    /// View summarization runs
    History {
        /// Show statistics summary
        #[arg(long)]
        stats: bool,

        /// Number of recent runs to list
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Print version information
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Input file, or - for stdin
    pub file: PathBuf,

    /// Document id in the summary store (defaults to the file stem)
    #[arg(long)]
    pub id: Option<String>,

    /// Ignore the stored summary and summarize again
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SummarizeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Token budget of the result (defaults to summarizer.target_tokens)
    #[arg(short, long)]
    pub target: Option<usize>,

    /// Custom system prompt; bypasses the summary store
    #[arg(short, long)]
    pub prompt: Option<String>,
}
