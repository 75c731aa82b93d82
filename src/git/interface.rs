//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to all Git operations in
//! stablecut. All repository access flows through [`Git`], which provides
//! structured results and normalizes errors into typed failure categories.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: No usable repository at a path
//! - [`GitError::BareRepo`]: Repository has no working tree
//! - [`GitError::RefNotFound`]: Requested ref does not exist
//! - [`GitError::CloneFailed`]: Clone or submodule update failed
//! - [`GitError::CheckoutFailed`]: Forced checkout could not complete
//!
//! # Example
//!
//! ```ignore
//! use stablecut::core::types::BranchName;
//! use stablecut::git::Git;
//! use std::path::Path;
//!
//! let git = Git::clone_recursive("git@github.com:acme/ui", Path::new("work/acme/ui"), &mut |_| {})?;
//! let head = git.checkout_branch_forced(&BranchName::new("main")?)?;
//! println!("main is at {}", head.short(7));
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{BranchName, Oid, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// No usable repository at the path (missing, invalid or corrupted).
    #[error("not a git repository: {path}: {message}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
        /// Why opening failed
        message: String,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Cloning (or updating a submodule of) a remote failed.
    #[error("failed to clone {url}: {message}")]
    CloneFailed {
        /// The remote being cloned
        url: String,
        /// The underlying failure
        message: String,
    },

    /// Forced checkout of a ref failed.
    #[error("failed to check out {refname}: {message}")]
    CheckoutFailed {
        /// The ref being checked out
        refname: String,
        /// The underlying failure
        message: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with the ref it concerned.
    fn from_git2(err: git2::Error, refname: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: refname.to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidRefName {
                message: format!("{}: {}", refname, err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", refname, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: err.message().to_string(),
            },
            _ => GitError::Internal {
                message: err.message().to_string(),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidBranchName(msg) => GitError::InvalidRefName { message: msg },
        }
    }
}

/// State of in-progress Git operations.
///
/// A forced checkout discards the working tree but not the bookkeeping of
/// an interrupted merge or rebase; this is how such leftovers are reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitState {
    /// No operation in progress.
    Clean,
    Rebase,
    Merge,
    CherryPick,
    Revert,
    Bisect,
    ApplyMailbox,
}

impl GitState {
    /// Check if any operation is in progress.
    ///
    /// # Example
    ///
    /// ```
    /// use stablecut::git::GitState;
    ///
    /// assert!(!GitState::Clean.is_in_progress());
    /// assert!(GitState::Merge.is_in_progress());
    /// ```
    pub fn is_in_progress(&self) -> bool {
        !matches!(self, GitState::Clean)
    }

    /// Get a human-readable description of the state.
    pub fn description(&self) -> &'static str {
        match self {
            GitState::Clean => "clean",
            GitState::Rebase => "rebase",
            GitState::Merge => "merge",
            GitState::CherryPick => "cherry-pick",
            GitState::Revert => "revert",
            GitState::Bisect => "bisect",
            GitState::ApplyMailbox => "apply-mailbox",
        }
    }
}

impl std::fmt::Display for GitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Summary of working tree status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeStatus {
    /// Number of staged changes
    pub staged: usize,
    /// Number of unstaged changes to tracked files
    pub unstaged: usize,
    /// Number of untracked files
    pub untracked: usize,
    /// Whether there are unresolved conflicts
    pub has_conflicts: bool,
}

impl WorktreeStatus {
    /// Check if the worktree has no tracked changes and no conflicts.
    ///
    /// Untracked files do not count: a forced checkout leaves them alone.
    pub fn is_clean(&self) -> bool {
        self.staged == 0 && self.unstaged == 0 && !self.has_conflicts
    }
}

/// Snapshot of clone transfer progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferProgress {
    pub received_objects: usize,
    pub total_objects: usize,
    pub indexed_deltas: usize,
    pub total_deltas: usize,
    pub received_bytes: usize,
}

impl TransferProgress {
    fn from_git2(stats: &git2::Progress<'_>) -> Self {
        Self {
            received_objects: stats.received_objects(),
            total_objects: stats.total_objects(),
            indexed_deltas: stats.indexed_deltas(),
            total_deltas: stats.total_deltas(),
            received_bytes: stats.received_bytes(),
        }
    }

    /// Whether every object has been received.
    pub fn is_complete(&self) -> bool {
        self.total_objects > 0
            && self.received_objects == self.total_objects
            && self.indexed_deltas == self.total_deltas
    }
}

/// Fetch options shared by the clone itself and every submodule update.
///
/// Authentication is delegated to a running ssh-agent for SSH remotes; the
/// agent is asked once per transfer so a rejected key fails the clone
/// instead of looping.
fn fetch_options<'a, F>(progress: &'a mut F) -> git2::FetchOptions<'a>
where
    F: FnMut(TransferProgress) + ?Sized,
{
    let mut callbacks = git2::RemoteCallbacks::new();
    let mut asked_agent = false;
    callbacks.credentials(move |_url, username, allowed| {
        if allowed.contains(git2::CredentialType::SSH_KEY) && !asked_agent {
            asked_agent = true;
            return git2::Cred::ssh_key_from_agent(username.unwrap_or("git"));
        }
        if allowed.contains(git2::CredentialType::DEFAULT) {
            return git2::Cred::default();
        }
        Err(git2::Error::from_str(
            "no usable credentials (is ssh-agent running with the right key?)",
        ))
    });
    callbacks.transfer_progress(move |stats| {
        progress(TransferProgress::from_git2(&stats));
        true
    });

    let mut options = git2::FetchOptions::new();
    options.remote_callbacks(callbacks);
    options
}

/// The Git interface.
///
/// This is the **single point of interaction** with Git. No other module
/// should import `git2` directly.
pub struct Git {
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening and Cloning
    // =========================================================================

    /// Open the repository whose working tree is exactly `path`.
    ///
    /// Unlike discovery, this never walks up to an enclosing repository: a
    /// work root that itself lives inside a checkout must not make an empty
    /// project directory look valid.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if the path is missing or not a valid repository
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|e| GitError::NotARepo {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        // A repository whose HEAD cannot be read is as unusable as a missing one.
        if let Err(e) = repo.head() {
            if e.code() != git2::ErrorCode::UnbornBranch {
                return Err(GitError::NotARepo {
                    path: path.to_path_buf(),
                    message: e.message().to_string(),
                });
            }
        }

        Ok(Self { repo })
    }

    /// Clone `url` into `path`, then initialize and update every submodule
    /// recursively.
    ///
    /// `progress` is called with transfer statistics for the main clone and
    /// for each submodule fetch.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::CloneFailed`] if the clone or any submodule update
    /// fails. A failed clone may leave a partial directory behind.
    pub fn clone_recursive<F>(url: &str, path: &Path, progress: &mut F) -> Result<Self, GitError>
    where
        F: FnMut(TransferProgress) + ?Sized,
    {
        let repo = {
            let mut builder = git2::build::RepoBuilder::new();
            builder.fetch_options(fetch_options(&mut *progress));
            builder.clone(url, path).map_err(|e| GitError::CloneFailed {
                url: url.to_string(),
                message: e.message().to_string(),
            })?
        };

        Self::update_submodules(&repo, url, progress)?;
        Ok(Self { repo })
    }

    fn update_submodules<F>(
        repo: &git2::Repository,
        url: &str,
        progress: &mut F,
    ) -> Result<(), GitError>
    where
        F: FnMut(TransferProgress) + ?Sized,
    {
        let failed = |name: &str, e: git2::Error| GitError::CloneFailed {
            url: url.to_string(),
            message: format!("submodule {}: {}", name, e.message()),
        };

        for mut submodule in repo.submodules()? {
            let name = submodule.name().unwrap_or("<unnamed>").to_string();
            {
                let mut options = git2::SubmoduleUpdateOptions::new();
                options.fetch(fetch_options(&mut *progress));
                submodule
                    .update(true, Some(&mut options))
                    .map_err(|e| failed(&name, e))?;
            }
            let sub_repo = submodule.open().map_err(|e| failed(&name, e))?;
            Self::update_submodules(&sub_repo, url, progress)?;
        }
        Ok(())
    }

    /// Path to the working directory.
    pub fn work_dir(&self) -> Result<&Path, GitError> {
        self.repo.workdir().ok_or(GitError::BareRepo)
    }

    // =========================================================================
    // State Detection
    // =========================================================================

    /// Get the current Git state (rebase, merge, etc.).
    pub fn state(&self) -> GitState {
        match self.repo.state() {
            git2::RepositoryState::Clean => GitState::Clean,
            git2::RepositoryState::Rebase
            | git2::RepositoryState::RebaseInteractive
            | git2::RepositoryState::RebaseMerge => GitState::Rebase,
            git2::RepositoryState::Merge => GitState::Merge,
            git2::RepositoryState::CherryPick | git2::RepositoryState::CherryPickSequence => {
                GitState::CherryPick
            }
            git2::RepositoryState::Revert | git2::RepositoryState::RevertSequence => {
                GitState::Revert
            }
            git2::RepositoryState::Bisect => GitState::Bisect,
            git2::RepositoryState::ApplyMailbox | git2::RepositoryState::ApplyMailboxOrRebase => {
                GitState::ApplyMailbox
            }
        }
    }

    /// Drop the bookkeeping of an in-progress merge, revert or cherry-pick.
    pub fn cleanup_state(&self) -> Result<(), GitError> {
        self.repo.cleanup_state().map_err(|e| GitError::Internal {
            message: format!("cannot clear {} state: {}", self.state(), e.message()),
        })
    }

    /// Get working tree status summary.
    pub fn worktree_status(&self, include_untracked: bool) -> Result<WorktreeStatus, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(include_untracked)
            .include_ignored(false)
            .exclude_submodules(true);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

        let mut result = WorktreeStatus::default();

        for entry in statuses.iter() {
            let status = entry.status();

            if status.is_conflicted() {
                result.has_conflicts = true;
            }

            if status.is_index_new()
                || status.is_index_modified()
                || status.is_index_deleted()
                || status.is_index_renamed()
                || status.is_index_typechange()
            {
                result.staged += 1;
            }

            if status.is_wt_modified()
                || status.is_wt_deleted()
                || status.is_wt_renamed()
                || status.is_wt_typechange()
            {
                result.unstaged += 1;
            }

            if status.is_wt_new() {
                result.untracked += 1;
            }
        }

        Ok(result)
    }

    // =========================================================================
    // Ref Resolution
    // =========================================================================

    /// Resolve a ref to the commit it points at.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if the ref doesn't exist
    pub fn resolve_ref(&self, refname: &str) -> Result<Oid, GitError> {
        let commit = self
            .repo
            .find_reference(refname)
            .and_then(|r| r.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, refname))?;

        Oid::new(commit.id().to_string()).map_err(|e| e.into())
    }

    /// Resolve a ref, returning None if it doesn't exist.
    pub fn try_resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        match self.resolve_ref(refname) {
            Ok(oid) => Ok(Some(oid)),
            Err(GitError::RefNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check if a ref exists.
    pub fn ref_exists(&self, refname: &str) -> bool {
        self.repo.find_reference(refname).is_ok()
    }

    /// Get HEAD commit OID.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if HEAD is unborn (empty repository)
    pub fn head_oid(&self) -> Result<Oid, GitError> {
        let commit = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        Oid::new(commit.id().to_string()).map_err(|e| e.into())
    }

    /// Get the current branch name, if on a branch.
    ///
    /// Returns `None` if HEAD is detached or unborn.
    pub fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(Some(BranchName::new(name)?));
            }
        }

        Ok(None)
    }

    /// Get the URL of a remote, or `None` if the remote doesn't exist.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::Internal {
                message: e.message().to_string(),
            }),
        }
    }

    // =========================================================================
    // Branch Mutation
    // =========================================================================

    /// Create a local branch at `target` and make it track `remote`.
    ///
    /// Fails if the branch already exists.
    pub fn create_tracking_branch(
        &self,
        branch: &BranchName,
        target: &Oid,
        remote: &str,
    ) -> Result<(), GitError> {
        let oid = git2::Oid::from_str(target.as_str()).map_err(|_| GitError::InvalidOid {
            oid: target.to_string(),
        })?;
        let commit = self
            .repo
            .find_commit(oid)
            .map_err(|e| GitError::from_git2(e, target.as_str()))?;

        let mut created = self
            .repo
            .branch(branch.as_str(), &commit, false)
            .map_err(|e| GitError::from_git2(e, &branch.local_ref()))?;
        created
            .set_upstream(Some(&format!("{}/{}", remote, branch)))
            .map_err(|e| GitError::from_git2(e, &branch.remote_ref(remote)))?;
        Ok(())
    }

    /// Force the working tree, index and HEAD onto a local branch.
    ///
    /// Tracked modifications are overwritten and HEAD is attached to
    /// `refs/heads/<branch>`. Untracked files are left in place. Returns the
    /// commit the working tree now matches.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if the local branch doesn't exist
    /// - [`GitError::CheckoutFailed`] if the tree cannot be written or HEAD moved
    pub fn checkout_branch_forced(&self, branch: &BranchName) -> Result<Oid, GitError> {
        let refname = branch.local_ref();
        let checkout_failed = |e: git2::Error| GitError::CheckoutFailed {
            refname: refname.clone(),
            message: e.message().to_string(),
        };

        let commit = self
            .repo
            .find_reference(&refname)
            .and_then(|r| r.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, &refname))?;

        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.force();
        self.repo
            .checkout_tree(commit.as_object(), Some(&mut checkout))
            .map_err(checkout_failed)?;
        self.repo.set_head(&refname).map_err(checkout_failed)?;

        // checkout_tree leaves entries staged against the old HEAD in place;
        // a hard reset makes the index match the branch exactly.
        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.force();
        self.repo
            .reset(commit.as_object(), git2::ResetType::Hard, Some(&mut checkout))
            .map_err(checkout_failed)?;

        Oid::new(commit.id().to_string()).map_err(|e| e.into())
    }
}
