//! ui
//!
//! Terminal output. Structured logs go through `tracing`; everything else
//! the operator sees is formatted in [`output`].

pub mod output;
