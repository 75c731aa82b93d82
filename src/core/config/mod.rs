//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment variables (handled by the CLI layer)
//! 4. CLI flags (handled by the CLI layer)
//!
//! # Config File Locations
//!
//! Searched in order, first existing file wins:
//! 1. The path passed with `--config` (must exist)
//! 2. `$STABLECUT_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/stablecut/config.toml`
//! 4. `~/.stablecut/config.toml`
//!
//! A missing config file is not an error; defaults are used.
//!
//! # Example
//!
//! ```no_run
//! use stablecut::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("Git host: {}", config.git_host());
//! println!("Work root: {}", config.work_dir().display());
//! ```

pub mod schema;

pub use schema::{CloneConfig, FileConfig, RecoveryConfig, RecoveryMode};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Remote host used when nothing else is configured.
pub const DEFAULT_GIT_HOST: &str = "git@github.com";

/// Work root used when nothing else is configured.
pub const DEFAULT_WORK_DIR: &str = "work";

/// Delay before the first clone retry when nothing else is configured.
pub const DEFAULT_CLONE_BACKOFF: Duration = Duration::from_millis(500);

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration with defaults applied through accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Raw file contents (all fields optional)
    pub file: FileConfig,
    /// Path the config was loaded from, if any
    path: Option<PathBuf>,
}

impl From<FileConfig> for Config {
    fn from(file: FileConfig) -> Self {
        Self { file, path: None }
    }
}

impl Config {
    /// Load configuration from `explicit` or the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if `explicit` is given but unreadable, or if a
    /// config file exists but cannot be parsed or fails validation.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let located = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::locate(|key| std::env::var(key).ok(), dirs::home_dir()),
        };

        match located {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Read, parse and validate a specific config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    /// Find the first existing config file among the default locations.
    fn locate(env: impl Fn(&str) -> Option<String>, home: Option<PathBuf>) -> Option<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(path) = env("STABLECUT_CONFIG") {
            candidates.push(PathBuf::from(path));
        }
        if let Some(xdg_home) = env("XDG_CONFIG_HOME") {
            candidates.push(PathBuf::from(xdg_home).join("stablecut/config.toml"));
        }
        if let Some(home) = home {
            candidates.push(home.join(".stablecut/config.toml"));
        }

        candidates.into_iter().find(|path| path.is_file())
    }

    /// Path the configuration was loaded from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn git_host(&self) -> &str {
        self.file.git_host.as_deref().unwrap_or(DEFAULT_GIT_HOST)
    }

    pub fn work_dir(&self) -> PathBuf {
        self.file
            .work_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORK_DIR))
    }

    pub fn keep_going(&self) -> bool {
        self.file.keep_going.unwrap_or(false)
    }

    /// Total clone attempts per project. Defaults to a single attempt.
    pub fn clone_attempts(&self) -> u32 {
        self.file
            .clone
            .as_ref()
            .and_then(|c| c.attempts)
            .unwrap_or(1)
    }

    pub fn clone_backoff(&self) -> Duration {
        self.file
            .clone
            .as_ref()
            .and_then(|c| c.backoff_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_CLONE_BACKOFF)
    }

    pub fn recovery_mode(&self) -> RecoveryMode {
        self.file
            .recovery
            .as_ref()
            .and_then(|r| r.mode)
            .unwrap_or_default()
    }
}
