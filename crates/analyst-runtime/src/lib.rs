//! Agent runtime for the stock analyst
//!
//! This crate provides the runtime infrastructure for running model calls:
//! the AgentExecutor tool-calling loop, the ToolAgent adapter to the
//! `Agent` trait, and AgentRuntime, which holds the shared provider and
//! defaults and hands out executors.

pub mod agents;
pub mod executor;
pub mod runtime;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types
pub use agents::ToolAgent;
pub use executor::{AgentExecutor, AgentExecutorBuilder, ExecutionOutcome, ExecutorConfig, ToolFailure};
pub use runtime::{AgentRuntime, AgentRuntimeBuilder, RuntimeConfig};
