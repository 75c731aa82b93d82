//! core::catalog
//!
//! Project catalog: the release metadata for every known repository.
//!
//! # Format
//!
//! The catalog is a JSON array of project records:
//!
//! ```json
//! [
//!   {
//!     "name": "doc-style",
//!     "git_organization": "acme",
//!     "labels": "docs",
//!     "maven_property_version": "doc-style.version",
//!     "release": {
//!       "branch": "main",
//!       "version": "2.1.0",
//!       "current_snapshot_version": "2.1.0-SNAPSHOT",
//!       "next_snapshot_version": "2.2.0-SNAPSHOT"
//!     }
//!   }
//! ]
//! ```
//!
//! Absent keys default to empty strings. A value of the wrong JSON type, or
//! a document that is not an array of records, rejects the whole catalog.
//!
//! # Invariants
//!
//! - A catalog is immutable once loaded
//! - Lookup is first-match: duplicate names are tolerated, never merged

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from catalog loading and lookup.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The catalog bytes are not a well-formed list of project records.
    #[error("malformed catalog: {0}")]
    Format(#[from] serde_json::Error),

    /// No project with the requested name exists.
    #[error("no project {name} found in the catalog")]
    ProjectNotFound { name: String },
}

/// Release metadata recorded for a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Release {
    /// Branch the stable branch is cut from.
    pub branch: String,
    /// Version being released.
    pub version: String,
    /// Snapshot version currently on the origin branch.
    #[serde(rename = "current_snapshot_version")]
    pub current_snapshot: String,
    /// Snapshot version the origin branch moves to after the release.
    #[serde(rename = "next_snapshot_version")]
    pub next_snapshot: String,
}

/// A repository described by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub name: String,
    #[serde(rename = "git_organization")]
    pub organization: String,
    pub labels: String,
    /// Build property holding the project version (e.g. a Maven property).
    #[serde(rename = "maven_property_version")]
    pub version_property: String,
    pub release: Release,
}

/// The loaded catalog.
///
/// Built once and passed by reference to whatever needs to resolve
/// projects; there is no process-wide catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    projects: Vec<Project>,
}

impl Catalog {
    /// Parse a catalog from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Format`] if the bytes are not a JSON array of
    /// project records. No partial catalog is ever returned.
    ///
    /// # Example
    ///
    /// ```
    /// use stablecut::core::catalog::Catalog;
    ///
    /// let catalog = Catalog::load(br#"[{"name": "doc-style", "git_organization": "acme"}]"#).unwrap();
    /// assert_eq!(catalog.resolve("doc-style").unwrap().organization, "acme");
    /// assert!(Catalog::load(b"{}").is_err());
    /// ```
    pub fn load(bytes: &[u8]) -> Result<Self, CatalogError> {
        let projects: Vec<Project> = serde_json::from_slice(bytes)?;
        Ok(Self { projects })
    }

    /// Read and parse a catalog file.
    pub fn load_file(path: &Path) -> Result<Self, CatalogError> {
        let bytes = std::fs::read(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load(&bytes)
    }

    /// Build a catalog from already-constructed projects.
    pub fn from_projects(projects: Vec<Project>) -> Self {
        Self { projects }
    }

    /// Find a project by name.
    ///
    /// If several entries share the name, the first one wins.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProjectNotFound`] if no entry matches.
    pub fn resolve(&self, name: &str) -> Result<&Project, CatalogError> {
        self.projects
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| CatalogError::ProjectNotFound {
                name: name.to_string(),
            })
    }

    /// All projects in catalog order.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Names that appear more than once, in order of their second appearance.
    ///
    /// Only the first entry of each such name is reachable through
    /// [`Catalog::resolve`].
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for project in &self.projects {
            let name = project.name.as_str();
            if !seen.insert(name) && !duplicates.contains(&name) {
                duplicates.push(name);
            }
        }
        duplicates
    }
}
