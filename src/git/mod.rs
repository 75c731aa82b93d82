//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. Opening, cloning and checking
//! out all flow through [`Git`]. No other module should import `git2`, and
//! nothing shells out to the git CLI.
//!
//! # Responsibilities
//!
//! - Opening a repository at an exact path
//! - Recursive clones with transfer progress
//! - Forced branch checkout
//! - Ref and status queries
//!
//! # Example
//!
//! ```ignore
//! use stablecut::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("work/acme/doc-style"))?;
//! let head = git.head_oid()?;
//! ```

mod interface;

pub use interface::{Git, GitError, GitState, TransferProgress, WorktreeStatus};
