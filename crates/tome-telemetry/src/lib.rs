//! Token estimation, state paths and run telemetry for tome

mod io;
mod paths;
mod tokens;
mod types;

pub use io::{append_jsonl, atomic_write, read_jsonl};
pub use paths::{Paths, HOME_ENV};
pub use tokens::{
    estimate, estimate_tokens, Encoding, EncodingError, TokenEstimator, DEFAULT_ENCODING,
};
pub use types::{RunOutcome, RunRecord};
