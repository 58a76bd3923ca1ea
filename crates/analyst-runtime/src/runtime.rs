//! Runtime holding the shared provider and executor defaults
//!
//! The AgentRuntime is built once per process. Components ask it for
//! executors, each with its own tools and system prompt, all sharing one
//! provider and one set of model settings.

use analyst_core::{Error, Result};
use analyst_llm::LLMProvider;
use analyst_tools::ToolRegistry;
use std::sync::Arc;
use std::time::Duration;

use crate::agents::ToolAgent;
use crate::executor::{AgentExecutor, ExecutorConfig};

/// Defaults applied to every executor the runtime creates
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Model identifier
    pub model: String,

    /// Maximum model calls per run
    pub max_iterations: usize,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Sampling temperature
    pub temperature: f32,

    /// Deadline for each model call
    pub call_timeout: Option<Duration>,

    /// Log every conversation message
    pub log_transcript: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4.1".to_string(),
            max_iterations: 10,
            max_tokens: 4096,
            temperature: 0.1,
            call_timeout: None,
            log_transcript: false,
        }
    }
}

/// Runtime for creating executors and agents over one provider
pub struct AgentRuntime {
    provider: Arc<dyn LLMProvider>,
    config: RuntimeConfig,
}

impl AgentRuntime {
    /// Create a new agent runtime
    pub fn new(provider: Arc<dyn LLMProvider>, config: RuntimeConfig) -> Self {
        Self { provider, config }
    }

    /// Create a new runtime builder
    pub fn builder() -> AgentRuntimeBuilder {
        AgentRuntimeBuilder::default()
    }

    /// Get a reference to the LLM provider
    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Get a reference to the runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Executor config seeded with the runtime defaults
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            max_iterations: self.config.max_iterations,
            model: self.config.model.clone(),
            system_prompt: None,
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            call_timeout: self.config.call_timeout,
            log_transcript: self.config.log_transcript,
            ..ExecutorConfig::default()
        }
    }

    /// Create an executor over the given tools
    pub fn executor(&self, tools: Arc<ToolRegistry>, config: ExecutorConfig) -> AgentExecutor {
        AgentExecutor::new(self.provider.clone(), tools, config)
    }

    /// Create a tool-using agent
    pub fn create_tool_agent(
        &self,
        tools: Arc<ToolRegistry>,
        config: ExecutorConfig,
        name: impl Into<String>,
    ) -> ToolAgent {
        ToolAgent::new(self.executor(tools, config), name)
    }
}

/// Builder for AgentRuntime
#[derive(Default)]
pub struct AgentRuntimeBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    config: RuntimeConfig,
}

impl AgentRuntimeBuilder {
    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the runtime
    pub fn build(self) -> Result<AgentRuntime> {
        let provider = self
            .provider
            .ok_or_else(|| Error::InitializationFailed("Provider not set".to_string()))?;
        Ok(AgentRuntime::new(provider, self.config))
    }
}
