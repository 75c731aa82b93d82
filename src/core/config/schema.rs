//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Example
//!
//! ```toml
//! git_host = "git@git.example.com"
//! work_dir = "/srv/release/work"
//! keep_going = false
//!
//! [clone]
//! attempts = 3
//! backoff_ms = 2000
//!
//! [recovery]
//! mode = "quarantine"
//! ```
//!
//! # Validation
//!
//! Values are validated after parsing; unknown keys are rejected at parse
//! time.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Upper bound on clone attempts accepted from configuration.
pub const MAX_CLONE_ATTEMPTS: u32 = 10;

/// What to do with a path that does not hold a usable repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryMode {
    /// Delete whatever occupies the path.
    #[default]
    Remove,
    /// Rename it aside to a timestamped sibling path.
    Quarantine,
}

/// Contents of a stablecut config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// SSH host prefix for remote URLs (e.g. `git@github.com`)
    pub git_host: Option<String>,

    /// Work root holding local clones
    pub work_dir: Option<PathBuf>,

    /// Continue with remaining projects after a failure
    pub keep_going: Option<bool>,

    /// Clone retry settings
    pub clone: Option<CloneConfig>,

    /// Handling of unusable local clones
    pub recovery: Option<RecoveryConfig>,
}

/// Clone retry settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CloneConfig {
    /// Total clone attempts per project, including the first
    pub attempts: Option<u32>,

    /// Delay before the first retry; doubles on each further retry
    pub backoff_ms: Option<u64>,
}

/// Recovery settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RecoveryConfig {
    pub mode: Option<RecoveryMode>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(host) = &self.git_host {
            validate_git_host(host)?;
        }

        if let Some(dir) = &self.work_dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "work_dir cannot be empty".to_string(),
                ));
            }
        }

        if let Some(attempts) = self.clone.as_ref().and_then(|c| c.attempts) {
            validate_clone_attempts(attempts)?;
        }

        Ok(())
    }
}

/// Check a git host value from any source.
pub fn validate_git_host(host: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::InvalidValue(
            "git_host cannot be empty".to_string(),
        ));
    }
    if host.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidValue(format!(
            "git_host '{}' cannot contain whitespace",
            host
        )));
    }
    if host.ends_with(':') {
        return Err(ConfigError::InvalidValue(format!(
            "git_host '{}' must not end with ':' (it is added automatically)",
            host
        )));
    }
    Ok(())
}

/// Check a clone attempt count from any source.
pub fn validate_clone_attempts(attempts: u32) -> Result<(), ConfigError> {
    if attempts == 0 || attempts > MAX_CLONE_ATTEMPTS {
        return Err(ConfigError::InvalidValue(format!(
            "clone attempts must be between 1 and {}, got {}",
            MAX_CLONE_ATTEMPTS, attempts
        )));
    }
    Ok(())
}
