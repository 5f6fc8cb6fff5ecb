//! Test utilities for the registrar workspace.
//!
//! Import from `[dev-dependencies]` only, never from production code.

pub mod fixture;
