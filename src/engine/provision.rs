//! engine::provision
//!
//! Force a materialized repository onto a branch.
//!
//! The working tree, index and HEAD end up exactly at the tip of the local
//! branch. Tracked modifications and the bookkeeping of interrupted
//! merges or rebases are discarded; untracked files are kept.
//!
//! A fresh clone only carries the remote's default branch locally. When the
//! requested branch exists only as `origin/<branch>`, a local tracking
//! branch is created from it before the checkout.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::types::{BranchName, Oid, TypeError};
use crate::git::{Git, GitError};

/// Remote the clone was made from.
pub const ORIGIN: &str = "origin";

/// Errors from checking out a branch.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The branch name from the catalog is not a valid git branch name.
    #[error("invalid branch name '{name}': {source}")]
    InvalidBranch {
        name: String,
        #[source]
        source: TypeError,
    },

    /// Neither `refs/heads/<branch>` nor `refs/remotes/origin/<branch>` exists.
    #[error("branch {branch} not found locally or on origin")]
    BranchNotFound { branch: String },

    /// The repository has no usable working tree.
    #[error("working tree unavailable: {0}")]
    Worktree(#[source] GitError),

    /// Git failed while moving the working tree.
    #[error("checkout of {branch} failed: {source}")]
    Failed {
        branch: String,
        #[source]
        source: GitError,
    },
}

/// Force `git`'s working tree onto `branch`, discarding local divergence.
///
/// Returns the commit the working tree now matches.
///
/// # Errors
///
/// - [`CheckoutError::InvalidBranch`] if `branch` is not a valid branch name
/// - [`CheckoutError::BranchNotFound`] if the branch exists neither locally nor on origin
/// - [`CheckoutError::Worktree`] if the repository is bare or its state cannot be cleared
/// - [`CheckoutError::Failed`] for any other git failure
pub fn checkout_and_reset(git: &Git, branch: &str) -> Result<Oid, CheckoutError> {
    let branch = BranchName::new(branch).map_err(|source| CheckoutError::InvalidBranch {
        name: branch.to_string(),
        source,
    })?;
    info!(branch = %branch, "checkout and reset");

    git.work_dir().map_err(CheckoutError::Worktree)?;
    ensure_local_branch(git, &branch)?;

    match git.worktree_status(false) {
        Ok(status) if !status.is_clean() => warn!(
            branch = %branch,
            staged = status.staged,
            unstaged = status.unstaged,
            conflicts = status.has_conflicts,
            "discarding local modifications"
        ),
        Ok(_) => {}
        Err(e) => debug!(error = %e, "cannot read worktree status"),
    }

    let state = git.state();
    if state.is_in_progress() {
        warn!(state = %state, "discarding in-progress operation");
        git.cleanup_state().map_err(CheckoutError::Worktree)?;
    }

    git.checkout_branch_forced(&branch)
        .map_err(|source| match source {
            GitError::RefNotFound { .. } => CheckoutError::BranchNotFound {
                branch: branch.to_string(),
            },
            source => CheckoutError::Failed {
                branch: branch.to_string(),
                source,
            },
        })
}

/// Make sure `refs/heads/<branch>` exists, creating it from origin if needed.
fn ensure_local_branch(git: &Git, branch: &BranchName) -> Result<(), CheckoutError> {
    if git.ref_exists(&branch.local_ref()) {
        return Ok(());
    }

    let failed = |source| CheckoutError::Failed {
        branch: branch.to_string(),
        source,
    };

    match git.try_resolve_ref(&branch.remote_ref(ORIGIN)).map_err(failed)? {
        Some(oid) => {
            info!(
                branch = %branch,
                commit = oid.short(7),
                remote = ORIGIN,
                "creating local branch from remote-tracking ref"
            );
            git.create_tracking_branch(branch, &oid, ORIGIN)
                .map_err(failed)
        }
        None => Err(CheckoutError::BranchNotFound {
            branch: branch.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_branch() {
        let err = CheckoutError::BranchNotFound {
            branch: "release/9".into(),
        };
        assert_eq!(err.to_string(), "branch release/9 not found locally or on origin");

        let err = CheckoutError::InvalidBranch {
            name: "a..b".into(),
            source: TypeError::InvalidBranchName("branch name cannot contain '..'".into()),
        };
        assert!(err.to_string().contains("a..b"));
    }

    #[test]
    fn worktree_error_wraps_git_error() {
        let err = CheckoutError::Worktree(GitError::BareRepo);
        assert!(err.to_string().contains("bare"));
    }
}
