//! cli
//!
//! Command-line interface layer for stablecut.
//!
//! # Responsibilities
//!
//! - Parse arguments and set up logging
//! - Merge defaults, config file, environment and flags into [`Settings`]
//! - Load the catalog and hand over to the [`crate::engine`], which locks
//!   the work root once the first project is materialized
//!
//! The CLI layer decides nothing about repositories itself; it only wires
//! the engine together and turns its outcome into an exit status.

pub mod args;

pub use args::Cli;

use std::path::PathBuf;

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::core::catalog::Catalog;
use crate::core::config::schema::{validate_clone_attempts, validate_git_host};
use crate::core::config::{Config, RecoveryMode};
use crate::core::paths::WorkspacePaths;
use crate::engine::{FailurePolicy, Git2Cloner, Materializer, RetryPolicy, Workflow};
use crate::ui::output::{self, Verbosity};

/// Effective settings for a run, with precedence applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub work_dir: PathBuf,
    pub git_host: String,
    pub policy: FailurePolicy,
    pub recovery: RecoveryMode,
    pub retry: RetryPolicy,
}

impl Settings {
    /// Merge CLI flags (which already carry environment values) over the
    /// config file and defaults.
    pub fn resolve(cli: &Cli, config: &Config) -> Result<Self> {
        let git_host = cli
            .git_host
            .clone()
            .unwrap_or_else(|| config.git_host().to_string());
        validate_git_host(&git_host)?;

        let attempts = cli.clone_attempts.unwrap_or_else(|| config.clone_attempts());
        validate_clone_attempts(attempts)?;

        let keep_going = cli.keep_going || config.keep_going();
        let recovery = if cli.quarantine {
            RecoveryMode::Quarantine
        } else {
            config.recovery_mode()
        };

        Ok(Self {
            work_dir: cli.work_dir.clone().unwrap_or_else(|| config.work_dir()),
            git_host,
            policy: if keep_going {
                FailurePolicy::Continue
            } else {
                FailurePolicy::FailFast
            },
            recovery,
            retry: RetryPolicy {
                attempts,
                backoff: config.clone_backoff(),
            },
        })
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbosity());
    execute(&cli)
}

/// Install the global tracing subscriber on stderr.
///
/// `RUST_LOG` directives are honoured on top of the verbosity default.
pub fn init_logging(verbosity: Verbosity) {
    let default_level = match verbosity {
        Verbosity::Quiet => tracing::Level::WARN,
        Verbosity::Normal => tracing::Level::INFO,
        Verbosity::Debug => tracing::Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Execute a parsed invocation.
pub fn execute(cli: &Cli) -> Result<()> {
    let verbosity = cli.verbosity();

    let config = Config::load(cli.config.as_deref())?;
    if let Some(path) = config.path() {
        info!(config = %path.display(), "configuration loaded");
    }
    let settings = Settings::resolve(cli, &config)?;

    let names = cli.project_names();
    if names.is_empty() {
        bail!("no project names given (expected a comma-separated list)");
    }

    info!(catalog = %cli.catalog.display(), "loading catalog file");
    let catalog = Catalog::load_file(&cli.catalog)?;
    info!(projects = catalog.len(), "catalog loaded");
    for name in catalog.duplicate_names() {
        warn!(name, "duplicate project name in catalog, only the first entry is used");
    }

    info!(projects = ?names, work_dir = %settings.work_dir.display(), "processing projects");

    let paths = WorkspacePaths::new(&settings.work_dir);
    let cloner = Git2Cloner::new(verbosity);
    let materializer = Materializer::new(paths, settings.git_host.as_str(), &cloner)
        .with_recovery(settings.recovery)
        .with_retry(settings.retry)
        .with_work_root_lock();
    let workflow = Workflow::new(&catalog, materializer).with_policy(settings.policy);

    let report = workflow.run(&names)?;
    output::print(output::format_summary(&report), verbosity);

    if !report.is_success() {
        bail!(
            "{} of {} project(s) failed",
            report.failures.len(),
            names.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{CloneConfig, FileConfig, RecoveryConfig};
    use clap::Parser;
    use std::time::Duration;

    fn parse_cli(args: &[&str]) -> Cli {
        let mut argv = vec!["stablecut", "catalog.json", "a"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let mut cli = parse_cli(&[]);
        // Ignore WORK_DIR / STABLECUT_GIT_HOST from the test environment
        cli.work_dir = None;
        cli.git_host = None;

        let settings = Settings::resolve(&cli, &Config::default()).unwrap();
        assert_eq!(settings.work_dir, PathBuf::from("work"));
        assert_eq!(settings.git_host, "git@github.com");
        assert_eq!(settings.policy, FailurePolicy::FailFast);
        assert_eq!(settings.recovery, RecoveryMode::Remove);
        assert_eq!(settings.retry.attempts, 1);
    }

    #[test]
    fn config_file_overrides_defaults() {
        let mut cli = parse_cli(&[]);
        cli.work_dir = None;
        cli.git_host = None;

        let config = Config::from(FileConfig {
            git_host: Some("git@git.internal".into()),
            work_dir: Some(PathBuf::from("/srv/work")),
            keep_going: Some(true),
            clone: Some(CloneConfig {
                attempts: Some(3),
                backoff_ms: Some(20),
            }),
            recovery: Some(RecoveryConfig {
                mode: Some(RecoveryMode::Quarantine),
            }),
        });

        let settings = Settings::resolve(&cli, &config).unwrap();
        assert_eq!(settings.work_dir, PathBuf::from("/srv/work"));
        assert_eq!(settings.git_host, "git@git.internal");
        assert_eq!(settings.policy, FailurePolicy::Continue);
        assert_eq!(settings.recovery, RecoveryMode::Quarantine);
        assert_eq!(
            settings.retry,
            RetryPolicy {
                attempts: 3,
                backoff: Duration::from_millis(20)
            }
        );
    }

    #[test]
    fn flags_override_config_file() {
        let cli = parse_cli(&[
            "--work-dir",
            "flag-work",
            "--git-host",
            "git@flag.host",
            "--clone-attempts",
            "2",
        ]);
        let config = Config::from(FileConfig {
            git_host: Some("git@git.internal".into()),
            work_dir: Some(PathBuf::from("/srv/work")),
            clone: Some(CloneConfig {
                attempts: Some(5),
                backoff_ms: None,
            }),
            ..Default::default()
        });

        let settings = Settings::resolve(&cli, &config).unwrap();
        assert_eq!(settings.work_dir, PathBuf::from("flag-work"));
        assert_eq!(settings.git_host, "git@flag.host");
        assert_eq!(settings.retry.attempts, 2);
    }

    #[test]
    fn invalid_flag_values_are_rejected() {
        let cli = parse_cli(&["--clone-attempts", "0", "--git-host", "git@h"]);
        assert!(Settings::resolve(&cli, &Config::default()).is_err());

        let cli = parse_cli(&["--git-host", "git@host:"]);
        assert!(Settings::resolve(&cli, &Config::default()).is_err());
    }
}
