//! engine::materialize
//!
//! Obtain a usable local clone of a project's repository.
//!
//! # Algorithm
//!
//! 1. Derive the remote URL and local directory from the project, rejecting
//!    catalog values that would resolve outside the work root
//! 2. Take the work root lock on first use, if configured
//! 3. Create the organization directory (idempotent)
//! 4. Open an existing repository at the directory, if any
//! 5. If that fails, discard whatever occupies the directory and clone
//!    afresh, recursing into submodules
//!
//! A directory left half-cloned or corrupted by an interrupted run is never
//! repaired in place: it is removed (or quarantined) and cloned again. Any
//! uncommitted work in it is lost in the default `remove` mode.
//!
//! # Cloning
//!
//! The transport is behind the [`Cloner`] trait. [`Git2Cloner`] is the
//! production implementation; tests substitute their own to observe and
//! count clone calls without network access.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::catalog::Project;
use crate::core::config::RecoveryMode;
use crate::core::ops::lock::{LockError, WorkRootLock};
use super::provision::ORIGIN;
use crate::core::paths::{remote_url, PathError, WorkspacePaths};
use crate::git::{Git, GitError};
use crate::ui::output::{ProgressLine, Verbosity};

/// Errors from materializing a repository.
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// The project's organization or name cannot be used as a directory.
    #[error(transparent)]
    InvalidProjectPath(#[from] PathError),

    /// The work root is locked by another run or cannot be locked.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// A directory could not be created, removed or renamed.
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The remote could not be cloned.
    #[error("repository {url} unavailable (clone into {path} failed after {attempts} attempt(s)): {source}")]
    RepositoryUnavailable {
        url: String,
        path: PathBuf,
        attempts: u32,
        #[source]
        source: GitError,
    },
}

/// Clones a remote repository into a local directory.
pub trait Cloner {
    /// Clone `url` into `path`, including submodules.
    ///
    /// `path` does not exist when this is called.
    fn clone_repository(&self, url: &str, path: &Path) -> Result<Git, GitError>;
}

/// Clones over the network with git2, drawing transfer progress on stdout.
#[derive(Debug, Clone, Copy)]
pub struct Git2Cloner {
    verbosity: Verbosity,
}

impl Git2Cloner {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

impl Cloner for Git2Cloner {
    fn clone_repository(&self, url: &str, path: &Path) -> Result<Git, GitError> {
        let mut line = ProgressLine::new(self.verbosity);
        let result = Git::clone_recursive(url, path, &mut |progress| line.update(&progress));
        line.finish();
        result
    }
}

/// Bounded retry around the clone step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub attempts: u32,
    /// Delay before the first retry; doubled for every further retry.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// A single attempt, no retry.
    pub fn none() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// Delay to wait before retry number `retry` (1-based).
    ///
    /// # Example
    ///
    /// ```
    /// use stablecut::engine::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy { attempts: 4, backoff: Duration::from_millis(100) };
    /// assert_eq!(policy.delay_before(1), Duration::from_millis(100));
    /// assert_eq!(policy.delay_before(3), Duration::from_millis(400));
    /// ```
    pub fn delay_before(&self, retry: u32) -> Duration {
        let factor = 1u32
            .checked_shl(retry.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// A materialized project repository.
#[derive(Debug)]
pub struct Materialized {
    pub git: Git,
    /// Local clone directory
    pub path: PathBuf,
    /// Remote the clone was (or would have been) made from
    pub remote_url: String,
    /// Whether a fresh clone was made during this run
    pub cloned: bool,
}

/// Ensures a usable local clone exists for a project.
pub struct Materializer<'a> {
    paths: WorkspacePaths,
    git_host: String,
    cloner: &'a dyn Cloner,
    recovery: RecoveryMode,
    retry: RetryPolicy,
    locking: bool,
    lock: RefCell<Option<WorkRootLock>>,
}

impl<'a> Materializer<'a> {
    /// Create a materializer with destructive recovery and no clone retry.
    pub fn new(paths: WorkspacePaths, git_host: impl Into<String>, cloner: &'a dyn Cloner) -> Self {
        Self {
            paths,
            git_host: git_host.into(),
            cloner,
            recovery: RecoveryMode::Remove,
            retry: RetryPolicy::none(),
            locking: false,
            lock: RefCell::new(None),
        }
    }

    /// Hold the work root lock from the first materialization until this
    /// materializer is dropped.
    ///
    /// The lock is taken lazily, so a run that fails before touching any
    /// project leaves the work root untouched.
    pub fn with_work_root_lock(mut self) -> Self {
        self.locking = true;
        self
    }

    pub fn with_recovery(mut self, recovery: RecoveryMode) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn paths(&self) -> &WorkspacePaths {
        &self.paths
    }

    /// Remote URL of a project under the configured host.
    pub fn remote_url(&self, project: &Project) -> String {
        remote_url(&self.git_host, &project.organization, &project.name)
    }

    /// Return a usable clone of `project`, cloning if needed.
    ///
    /// # Errors
    ///
    /// - [`MaterializeError::InvalidProjectPath`] if the organization or name
    ///   is not a plain directory name
    /// - [`MaterializeError::Lock`] if the work root lock cannot be taken
    /// - [`MaterializeError::Filesystem`] if directories cannot be prepared
    /// - [`MaterializeError::RepositoryUnavailable`] if cloning fails
    pub fn materialize(&self, project: &Project) -> Result<Materialized, MaterializeError> {
        let dir = self.paths.project_dir(&project.organization, &project.name)?;
        let parent = self.paths.organization_dir(&project.organization)?;
        let url = self.remote_url(project);

        info!(
            git_url = %url,
            directory = %dir.display(),
            "materializing project"
        );

        self.ensure_locked()?;
        fs::create_dir_all(&parent).map_err(|source| MaterializeError::Filesystem {
            path: parent.clone(),
            source,
        })?;

        debug!(directory = %dir.display(), "opening repository");
        match Git::open(&dir) {
            Ok(git) => {
                info!(directory = %dir.display(), "reusing existing clone");
                match git.remote_url(ORIGIN) {
                    Ok(Some(origin)) if origin != url => warn!(
                        directory = %dir.display(),
                        origin = %origin,
                        expected = %url,
                        "existing clone has a different origin"
                    ),
                    Ok(Some(_)) => {}
                    Ok(None) => warn!(directory = %dir.display(), "existing clone has no origin remote"),
                    Err(e) => debug!(error = %e, "cannot read origin remote"),
                }
                return Ok(Materialized {
                    git,
                    path: dir,
                    remote_url: url,
                    cloned: false,
                });
            }
            Err(e) => {
                info!(
                    error = %e,
                    directory = %dir.display(),
                    "cannot open repository, cleaning and cloning"
                );
            }
        }

        self.discard(&dir)?;
        let git = self.clone_with_retry(&url, &dir)?;

        Ok(Materialized {
            git,
            path: dir,
            remote_url: url,
            cloned: true,
        })
    }

    fn ensure_locked(&self) -> Result<(), MaterializeError> {
        if !self.locking {
            return Ok(());
        }
        let mut lock = self.lock.borrow_mut();
        if lock.is_none() {
            let acquired = WorkRootLock::acquire(&self.paths)?;
            debug!(lock = %acquired.path().display(), "work root locked");
            *lock = Some(acquired);
        }
        Ok(())
    }

    /// Whether this materializer currently holds the work root lock.
    pub fn holds_lock(&self) -> bool {
        self.lock.borrow().as_ref().is_some_and(WorkRootLock::is_held)
    }

    /// Clear `dir` according to the recovery mode.
    fn discard(&self, dir: &Path) -> Result<(), MaterializeError> {
        match self.recovery {
            RecoveryMode::Remove => {
                if remove_path(dir)? {
                    warn!(directory = %dir.display(), "removed unusable repository directory");
                }
            }
            RecoveryMode::Quarantine => {
                if let Some(target) = quarantine_path(dir)? {
                    warn!(
                        directory = %dir.display(),
                        quarantine = %target.display(),
                        "moved unusable repository directory aside"
                    );
                }
            }
        }
        Ok(())
    }

    fn clone_with_retry(&self, url: &str, dir: &Path) -> Result<Git, MaterializeError> {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!(git_url = %url, attempt, attempts, "cloning");
            match self.cloner.clone_repository(url, dir) {
                Ok(git) => return Ok(git),
                Err(e) if attempt < attempts => {
                    let delay = self.retry.delay_before(attempt);
                    warn!(
                        git_url = %url,
                        error = %e,
                        attempt,
                        attempts,
                        delay = ?delay,
                        "clone failed, retrying"
                    );
                    // A failed clone can leave a partial directory behind
                    remove_path(dir)?;
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(source) => {
                    return Err(MaterializeError::RepositoryUnavailable {
                        url: url.to_string(),
                        path: dir.to_path_buf(),
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }
}

/// Remove whatever occupies `path`. Returns whether anything was there.
fn remove_path(path: &Path) -> Result<bool, MaterializeError> {
    let fs_error = |source| MaterializeError::Filesystem {
        path: path.to_path_buf(),
        source,
    };

    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(fs_error(e)),
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path).map_err(fs_error)?;
    } else {
        fs::remove_file(path).map_err(fs_error)?;
    }
    Ok(true)
}

/// Rename whatever occupies `path` to a timestamped sibling.
///
/// Returns the new location, or `None` if nothing was there.
fn quarantine_path(path: &Path) -> Result<Option<PathBuf>, MaterializeError> {
    match fs::symlink_metadata(path) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(MaterializeError::Filesystem {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string();
    let target = WorkspacePaths::quarantine_path(path, &stamp);
    fs::rename(path, &target).map_err(|source| MaterializeError::Filesystem {
        path: target.clone(),
        source,
    })?;
    Ok(Some(target))
}
