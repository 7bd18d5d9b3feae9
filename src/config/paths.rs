//! Path resolution for studytrack configuration and data files.
//!
//! All studytrack data is stored in `~/.studytrack/` unless the
//! `STUDYTRACK_HOME` environment variable points elsewhere:
//! - `config.yaml` - Main configuration file
//! - `studytrack.db` - SQLite database for users, sessions and activities

use std::path::PathBuf;

use crate::error::TrackerError;

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "STUDYTRACK_HOME";

/// Paths to studytrack configuration and data files.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root directory: `~/.studytrack/`
    pub root: PathBuf,
    /// Config file: `~/.studytrack/config.yaml`
    pub config_file: PathBuf,
    /// Database file: `~/.studytrack/studytrack.db`
    pub database: PathBuf,
}

impl Paths {
    /// Resolve paths from `STUDYTRACK_HOME`, falling back to the user's home
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if neither variable is set.
    pub fn new() -> Result<Self, TrackerError> {
        if let Ok(root) = std::env::var(HOME_ENV) {
            return Ok(Self::with_root(PathBuf::from(root)));
        }

        let home = std::env::var("HOME")
            .map_err(|_| TrackerError::Config("Could not determine home directory".to_string()))?;

        Ok(Self::with_root(PathBuf::from(home).join(".studytrack")))
    }

    /// Create paths with a custom root directory.
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.yaml"),
            database: root.join("studytrack.db"),
            root,
        }
    }

    /// Ensure the root directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_dirs(&self) -> Result<(), TrackerError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| {
                TrackerError::Config(format!(
                    "Failed to create directory {}: {e}",
                    self.root.display()
                ))
            })?;
        }
        Ok(())
    }
}
