//! engine
//!
//! Orchestrates release preparation: Resolve -> Materialize -> Name -> Checkout.
//!
//! # Architecture
//!
//! - [`materialize`] - Obtain a usable local clone, re-cloning unusable ones
//! - [`provision`] - Force a clone's working tree onto a branch
//! - [`workflow`] - Run both for each requested project, in order
//!
//! # Invariants
//!
//! - Projects are processed sequentially, in the order requested
//! - No component terminates the process; errors flow back to the caller
//! - Already-prepared projects are never rolled back
//!
//! # Example
//!
//! ```ignore
//! use stablecut::core::catalog::Catalog;
//! use stablecut::core::paths::WorkspacePaths;
//! use stablecut::engine::{Git2Cloner, Materializer, Workflow};
//! use stablecut::ui::output::Verbosity;
//!
//! let catalog = Catalog::load_file(Path::new("catalog.json"))?;
//! let cloner = Git2Cloner::new(Verbosity::Normal);
//! let materializer = Materializer::new(WorkspacePaths::new("work"), "git@github.com", &cloner);
//! let report = Workflow::new(&catalog, materializer).run(&["doc-style"])?;
//! ```

pub mod materialize;
pub mod provision;
pub mod workflow;

pub use materialize::{
    Cloner, Git2Cloner, MaterializeError, Materialized, Materializer, RetryPolicy,
};
pub use provision::{checkout_and_reset, CheckoutError};
pub use workflow::{FailurePolicy, ProvisionedProject, RunReport, Workflow, WorkflowError};
