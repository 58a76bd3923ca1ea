//! Core abstractions shared by every analyst crate
//!
//! Defines the [`Agent`] trait that protocol adapters call into, the
//! per-request [`Context`] bag, and the framework [`Error`] with its
//! [`FailureKind`] classification of upstream failures.

pub mod agent;
pub mod context;
pub mod error;

pub use agent::Agent;
pub use context::Context;
pub use error::{Error, FailureKind, Result};
