//! Cross-cutting HTTP plumbing for the registrar service: tracing setup,
//! health probes, request ids and wire-format helpers.

pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
