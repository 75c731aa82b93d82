//! engine::workflow
//!
//! Drive the release preparation of a list of projects.
//!
//! # Lifecycle
//!
//! For each requested name, in the order given:
//!
//! ```text
//! Resolved -> Materialized -> BranchNamed -> CheckedOut
//! ```
//!
//! The stable branch name is computed from the current snapshot version
//! and reported, but the branch itself is not created: the run leaves each
//! repository on its release's origin branch, ready for the cut.
//!
//! # Failure Policy
//!
//! [`FailurePolicy::FailFast`] stops at the first failing project and
//! returns its error. [`FailurePolicy::Continue`] records the failure and
//! moves on. Projects already provisioned are never rolled back.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, info};

use super::materialize::{MaterializeError, Materializer};
use super::provision::{self, CheckoutError};
use crate::core::catalog::{Catalog, CatalogError};
use crate::core::naming::stable_branch_name;
use crate::core::types::Oid;

/// What to do when a project fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the run at the first failure.
    #[default]
    FailFast,
    /// Record the failure and continue with the next project.
    Continue,
}

/// A failure while preparing one project.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The name could not be resolved in the catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The project's repository could not be materialized.
    #[error("project {project}: {source}")]
    Materialize {
        project: String,
        #[source]
        source: MaterializeError,
    },

    /// The project's origin branch could not be checked out.
    #[error("project {project}: {source}")]
    Checkout {
        project: String,
        #[source]
        source: CheckoutError,
    },
}

/// A project left on its origin branch, ready for a stable branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedProject {
    pub name: String,
    /// Local clone directory
    pub path: PathBuf,
    pub remote_url: String,
    /// Branch the working tree is now on
    pub origin_branch: String,
    /// Name the stable branch will get
    pub stable_branch: String,
    /// Commit the working tree matches
    pub head: Oid,
    /// Whether the repository was freshly cloned
    pub cloned: bool,
}

/// Outcome of a run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Successfully prepared projects, in processing order.
    pub provisioned: Vec<ProvisionedProject>,
    /// Failed projects with their errors (only under [`FailurePolicy::Continue`]).
    pub failures: Vec<(String, WorkflowError)>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Prepares projects from a catalog, one after the other.
pub struct Workflow<'a> {
    catalog: &'a Catalog,
    materializer: Materializer<'a>,
    policy: FailurePolicy,
}

impl<'a> Workflow<'a> {
    pub fn new(catalog: &'a Catalog, materializer: Materializer<'a>) -> Self {
        Self {
            catalog,
            materializer,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Prepare every named project in order.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::FailFast`], returns the first project's error;
    /// later projects are not attempted. Under [`FailurePolicy::Continue`]
    /// this always returns `Ok` and failures are listed in the report.
    pub fn run<S: AsRef<str>>(&self, names: &[S]) -> Result<RunReport, WorkflowError> {
        let mut report = RunReport::default();

        for name in names {
            let name = name.as_ref();
            match self.provision(name) {
                Ok(project) => report.provisioned.push(project),
                Err(e) => match self.policy {
                    FailurePolicy::FailFast => return Err(e),
                    FailurePolicy::Continue => {
                        error!(project = name, error = %e, "project failed, continuing");
                        report.failures.push((name.to_string(), e));
                    }
                },
            }
        }

        Ok(report)
    }

    /// Prepare a single project.
    pub fn provision(&self, name: &str) -> Result<ProvisionedProject, WorkflowError> {
        info!(project = name, "preparing stable branch");

        let project = self.catalog.resolve(name)?;
        info!(
            name = %project.name,
            orga = %project.organization,
            current_version = %project.release.current_snapshot,
            next_version = %project.release.next_snapshot,
            "project found"
        );

        let materialized =
            self.materializer
                .materialize(project)
                .map_err(|source| WorkflowError::Materialize {
                    project: name.to_string(),
                    source,
                })?;

        let stable_branch = stable_branch_name(&project.release.current_snapshot);
        let origin_branch = project.release.branch.clone();
        info!(
            project = %project.name,
            origin_branch = %origin_branch,
            stable_branch = %stable_branch,
            "resetting origin branch"
        );

        let head = provision::checkout_and_reset(&materialized.git, &origin_branch).map_err(
            |source| WorkflowError::Checkout {
                project: name.to_string(),
                source,
            },
        )?;

        Ok(ProvisionedProject {
            name: project.name.clone(),
            path: materialized.path,
            remote_url: materialized.remote_url,
            origin_branch,
            stable_branch,
            head,
            cloned: materialized.cloned,
        })
    }
}
