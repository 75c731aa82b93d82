//! core
//!
//! Domain types and the pure pieces of a run.
//!
//! # Modules
//!
//! - [`catalog`] - Project catalog schema and lookup
//! - [`config`] - Configuration schema and loading
//! - [`naming`] - Stable branch naming
//! - [`ops`] - Work root locking
//! - [`paths`] - Remote URLs and local directory layout
//! - [`types`] - Strong types: BranchName, Oid
//!
//! Nothing in here touches a repository; see [`crate::git`] for that.

pub mod catalog;
pub mod config;
pub mod naming;
pub mod ops;
pub mod paths;
pub mod types;
