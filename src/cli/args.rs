//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Positional Arguments
//!
//! - `<CATALOG>`: Path to the catalog file
//! - `<PROJECTS>`: Comma-separated project names
//!
//! # Environment
//!
//! - `WORK_DIR`: Work root (same as `--work-dir`)
//! - `STABLECUT_GIT_HOST`: Remote host (same as `--git-host`)
//! - `RUST_LOG`: Log filter directives

use clap::Parser;
use std::path::PathBuf;

use crate::ui::output::Verbosity;

/// stablecut - Prepare catalog projects for cutting a stable branch
#[derive(Parser, Debug)]
#[command(name = "stablecut")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
EXAMPLES:
    # Prepare two projects, cloning into ./work
    stablecut catalog.json platform-ui,doc-style

    # Use another work root and keep going past failing projects
    WORK_DIR=/srv/release stablecut catalog.json platform-ui,doc-style --keep-going

NOTES:
    Each project is cloned into <work-root>/<organization>/<name> from
    <git-host>:<organization>/<name> and reset to its release branch.
    A directory there that is not a usable repository is deleted and
    re-cloned (or moved aside with --quarantine).")]
pub struct Cli {
    /// Path to the catalog file
    pub catalog: PathBuf,

    /// Projects to prepare, comma separated (e.g. platform-ui,doc-style)
    pub projects: String,

    /// Work root holding local clones [default: work]
    #[arg(long, env = "WORK_DIR", value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Remote host prefix, e.g. git@github.com [default: git@github.com]
    #[arg(long, env = "STABLECUT_GIT_HOST", value_name = "HOST")]
    pub git_host: Option<String>,

    /// Config file to use instead of the default locations
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Continue with remaining projects after a failure
    #[arg(long)]
    pub keep_going: bool,

    /// Move unusable clones aside instead of deleting them
    #[arg(long)]
    pub quarantine: bool,

    /// Total clone attempts per project [default: 1]
    #[arg(long, value_name = "N")]
    pub clone_attempts: Option<u32>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, conflicts_with = "debug")]
    pub quiet: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Requested project names, in order.
    pub fn project_names(&self) -> Vec<String> {
        split_project_list(&self.projects)
    }

    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }
}

/// Split a comma-separated project list.
///
/// Whitespace around names is trimmed and empty entries are dropped; order
/// and repeated names are kept.
///
/// # Example
///
/// ```
/// use stablecut::cli::args::split_project_list;
///
/// assert_eq!(split_project_list("platform-ui, doc-style,"), vec!["platform-ui", "doc-style"]);
/// ```
pub fn split_project_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}
