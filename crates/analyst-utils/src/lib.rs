//! Shared utilities for the stock analyst
//!
//! Logging setup and typed environment-variable lookup, used by the domain
//! crate's configuration and by the CLI.

pub mod env;
pub mod logging;

pub use env::{EnvError, EnvSource};
pub use logging::{LogFormat, LogSettings, init_tracing};
