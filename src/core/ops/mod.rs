//! core::ops
//!
//! Run-wide coordination.
//!
//! - [`lock`] - Exclusive work root lock, held for the whole run

pub mod lock;
