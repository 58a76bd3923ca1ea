//! Tool agent implementation (wraps AgentExecutor)

use crate::executor::AgentExecutor;
use analyst_core::{Agent, Context, Result};
use async_trait::async_trait;
use tracing::info;

/// An agent that answers through the executor's tool-calling loop
///
/// The conversation starts fresh on every `process` call; nothing is kept
/// between requests.
pub struct ToolAgent {
    executor: AgentExecutor,
    name: String,
    description: String,
}

impl ToolAgent {
    /// Create a new tool agent
    pub fn new(executor: AgentExecutor, name: impl Into<String>) -> Self {
        Self {
            executor,
            name: name.into(),
            description: String::new(),
        }
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Get a reference to the underlying executor
    pub fn executor(&self) -> &AgentExecutor {
        &self.executor
    }
}

#[async_trait]
impl Agent for ToolAgent {
    async fn process(&self, input: String, context: &mut Context) -> Result<String> {
        let outcome = self.executor.execute(input).await?;
        info!(
            agent = %self.name,
            request_id = context.request_id().unwrap_or("-"),
            iterations = outcome.iterations,
            tool_calls = outcome.tool_calls,
            "Tool agent finished"
        );
        Ok(outcome.text)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }
}
