//! Path resolution for tome state files

use std::path::PathBuf;

/// Environment variable that relocates the state directory
pub const HOME_ENV: &str = "TOME_HOME";

/// Resolves standard paths for configuration, run logs and the summary store
#[derive(Debug, Clone)]
pub struct Paths {
    pub home: PathBuf,
}

impl Paths {
    /// `$TOME_HOME` if set, otherwise `~/.tome`
    pub fn new() -> std::io::Result<Self> {
        if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::at(PathBuf::from(dir)));
        }

        let home = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?;

        Ok(Self::at(home.join(".tome")))
    }

    pub fn at(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Get config.json path
    pub fn config_file(&self) -> PathBuf {
        self.home.join("config.json")
    }

    /// Get runs.jsonl path
    pub fn runs_file(&self) -> PathBuf {
        self.home.join("runs.jsonl")
    }

    /// Get the SQLite summary store path
    pub fn summaries_db(&self) -> PathBuf {
        self.home.join("summaries.db")
    }
}
