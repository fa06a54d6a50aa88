//! Configuration for PrefStore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{PrefError, Result};

/// Main configuration for a Preferences instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Canonical snapshot file.
    /// Layout on disk:
    ///   {dir}/
    ///     ├── {name}          (canonical snapshot)
    ///     └── {name}{suffix}  (backup, only during an interrupted write)
    pub path: PathBuf,

    /// Suffix appended to the file name to form the backup artifact
    pub backup_suffix: String,

    // -------------------------------------------------------------------------
    // Loader Configuration
    // -------------------------------------------------------------------------
    /// Whether the initial load runs on the constructing thread
    pub load_mode: LoadMode,

    // -------------------------------------------------------------------------
    // Worker Configuration
    // -------------------------------------------------------------------------
    /// Threads in the worker pool created by `Preferences::open`.
    /// Ignored when an executor is injected.
    pub worker_threads: usize,
}

/// Where the one-time initial load runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Recover and decode on the constructing thread before returning
    Inline,

    /// Recover and decode on the worker pool; first access waits for it
    Background,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./prefstore.prefs"),
            backup_suffix: ".bak".to_string(),
            load_mode: LoadMode::Background,
            worker_threads: 2,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Path of the backup artifact next to the canonical file
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(&self.backup_suffix);
        self.path.with_file_name(name)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.path.file_name().is_none() {
            return Err(PrefError::Config(format!(
                "path must name a file: {}",
                self.path.display()
            )));
        }
        if self.backup_suffix.is_empty() {
            return Err(PrefError::Config("backup_suffix must not be empty".into()));
        }
        if self.worker_threads == 0 {
            return Err(PrefError::Config("worker_threads must be > 0".into()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the canonical snapshot file
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the backup suffix
    pub fn backup_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.backup_suffix = suffix.into();
        self
    }

    /// Set where the initial load runs
    pub fn load_mode(mut self, mode: LoadMode) -> Self {
        self.config.load_mode = mode;
        self
    }

    /// Set the worker pool size
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
