//! core::paths
//!
//! Centralized path routing for the work root.
//!
//! # Architecture
//!
//! Every on-disk location stablecut touches is derived here from the work
//! root, and every remote URL from the configured git host. No other module
//! joins organization or project names onto a path by hand.
//!
//! # Layout
//!
//! - `<work_root>/.stablecut.lock` - Advisory lock held for a whole run
//! - `<work_root>/<organization>/` - One directory per organization
//! - `<work_root>/<organization>/<name>/` - Local clone of a project
//! - `<work_root>/<organization>/<name>.quarantine-<stamp>/` - Unusable clone set aside
//!
//! # Example
//!
//! ```
//! use stablecut::core::paths::{remote_url, WorkspacePaths};
//! use std::path::PathBuf;
//!
//! let paths = WorkspacePaths::new("work");
//! assert_eq!(
//!     paths.project_dir("acme", "doc-style"),
//!     Ok(PathBuf::from("work/acme/doc-style"))
//! );
//! assert!(paths.project_dir("acme", "..").is_err());
//! assert_eq!(
//!     remote_url("git@github.com", "acme", "doc-style"),
//!     "git@github.com:acme/doc-style"
//! );
//! ```

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Name of the lock file inside the work root.
const LOCK_FILE: &str = ".stablecut.lock";

/// Errors from deriving a work root path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// A catalog value is not a single plain path component.
    #[error("invalid {field} '{value}': {reason}")]
    InvalidComponent {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Check that `value` names exactly one plain directory entry.
///
/// Empty values, `.`, `..`, absolute paths and anything containing a path
/// separator are rejected, so a derived path can never leave its parent.
pub fn validate_component(field: &'static str, value: &str) -> Result<(), PathError> {
    let invalid = |reason| PathError::InvalidComponent {
        field,
        value: value.to_string(),
        reason,
    };

    if value.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if value.contains('/') || value.contains('\\') {
        return Err(invalid("must not contain a path separator"));
    }

    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        (Some(Component::CurDir | Component::ParentDir), None) => {
            Err(invalid("must not be '.' or '..'"))
        }
        _ => Err(invalid("must be a single directory name")),
    }
}

/// Build the SSH-style remote URL of a project: `<host>:<organization>/<name>`.
pub fn remote_url(git_host: &str, organization: &str, name: &str) -> String {
    format!("{}:{}/{}", git_host, organization, name)
}

/// Path routing for everything under the work root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    work_root: PathBuf,
}

impl WorkspacePaths {
    /// Create path routing rooted at `work_root`.
    ///
    /// The root is kept as given; a relative root resolves against the
    /// process working directory.
    pub fn new(work_root: impl Into<PathBuf>) -> Self {
        Self {
            work_root: work_root.into(),
        }
    }

    pub fn work_root(&self) -> &Path {
        &self.work_root
    }

    /// Directory holding every clone of an organization.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::InvalidComponent`] unless `organization` is a
    /// single plain directory name.
    pub fn organization_dir(&self, organization: &str) -> Result<PathBuf, PathError> {
        validate_component("organization", organization)?;
        Ok(self.work_root.join(organization))
    }

    /// Local clone location of a project, always a direct child of its
    /// organization directory.
    pub fn project_dir(&self, organization: &str, name: &str) -> Result<PathBuf, PathError> {
        validate_component("project name", name)?;
        Ok(self.organization_dir(organization)?.join(name))
    }

    /// Lock file guarding the whole work root.
    pub fn lock_path(&self) -> PathBuf {
        self.work_root.join(LOCK_FILE)
    }

    /// Where an unusable clone at `project_dir` is moved in quarantine mode.
    ///
    /// The stamp is appended to the final component so the quarantined copy
    /// stays next to the clone it replaced.
    ///
    /// # Example
    ///
    /// ```
    /// use stablecut::core::paths::WorkspacePaths;
    /// use std::path::{Path, PathBuf};
    ///
    /// assert_eq!(
    ///     WorkspacePaths::quarantine_path(Path::new("work/acme/ui"), "20260101T000000Z"),
    ///     PathBuf::from("work/acme/ui.quarantine-20260101T000000Z")
    /// );
    /// ```
    pub fn quarantine_path(project_dir: &Path, stamp: &str) -> PathBuf {
        let mut name = project_dir
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".quarantine-{}", stamp));
        project_dir.with_file_name(name)
    }
}
