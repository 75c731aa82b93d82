//! Stablecut - Prepare catalog projects for cutting a stable release branch
//!
//! Stablecut reads a catalog of projects, makes sure each requested project
//! has a usable local clone under a work root, forces that clone onto its
//! release's origin branch and reports the stable branch name derived from
//! the project's current snapshot version.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Orchestrates Resolve → Materialize → Name → Checkout
//! - [`core`] - Catalog, naming, paths, configuration and locking
//! - [`git`] - Single interface for all Git operations
//! - [`ui`] - Terminal output
//!
//! # Invariants
//!
//! 1. A project directory is either a usable repository or gets re-cloned
//! 2. A prepared project's working tree matches its origin branch exactly
//! 3. Projects are processed one at a time, in the order requested
//! 4. Only one run touches a work root at a time

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod ui;
