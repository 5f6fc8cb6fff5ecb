//! In-process change notification for the registrar.
//!
//! Handlers run synchronously on the emitting task. Nothing crosses process
//! boundaries and nothing is persisted.

pub mod bus;
pub mod student;

pub use bus::{EmitReport, EventBus, Subscription};
pub use student::StudentChange;
