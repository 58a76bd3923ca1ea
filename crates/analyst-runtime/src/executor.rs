//! Agent executor for running tool-calling loops
//!
//! The AgentExecutor implements the reason/act/observe loop:
//! 1. Call the model with the conversation so far and the available tools
//! 2. If the reply requests tool calls, run them and append the results
//! 3. Otherwise return the reply text
//!
//! Tool failures never abort the loop; they are sent back to the model as
//! error results and tallied in the [`ExecutionOutcome`] so callers can tell
//! "the model gave up on research" apart from "research was never tried".

use analyst_core::{Error, FailureKind, Result};
use analyst_llm::{
    CompletionRequest, LLMProvider, Message, ResponseFormat, StopReason, TokenUsage, ToolCall,
    ToolDefinition,
};
use analyst_tools::ToolRegistry;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Configuration for agent execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of model calls in one run
    pub max_iterations: usize,

    /// Model to use
    pub model: String,

    /// System prompt
    pub system_prompt: Option<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Requested output format
    pub response_format: ResponseFormat,

    /// Deadline for each individual model call
    pub call_timeout: Option<Duration>,

    /// Log every conversation message at info level
    pub log_transcript: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            model: "gpt-4.1".to_string(),
            system_prompt: None,
            max_tokens: 4096,
            temperature: Some(0.1),
            response_format: ResponseFormat::Text,
            call_timeout: None,
            log_transcript: false,
        }
    }
}

impl ExecutorConfig {
    /// Same config with a different system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Same config with a different output format
    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }
}

/// A tool call that failed during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolFailure {
    /// Tool name as requested by the model
    pub tool: String,
    /// Failure classification of the tool's error
    pub kind: FailureKind,
    /// Error message sent back to the model
    pub message: String,
}

/// Result of one executor run
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    /// Final assistant text
    pub text: String,
    /// Model calls made
    pub iterations: usize,
    /// Tool calls requested by the model
    pub tool_calls: usize,
    /// Every tool call that failed, in call order
    pub tool_failures: Vec<ToolFailure>,
    /// Tokens used across all calls
    pub usage: TokenUsage,
    /// Why the last call stopped
    pub stop_reason: StopReason,
}

/// Executes an agent loop: model → tool calls → execution → loop back
pub struct AgentExecutor {
    provider: Arc<dyn LLMProvider>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
}

impl AgentExecutor {
    /// Create a new agent executor
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        tool_registry: Arc<ToolRegistry>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            provider,
            tool_registry,
            config,
        }
    }

    /// Create a builder
    pub fn builder() -> AgentExecutorBuilder {
        AgentExecutorBuilder::new()
    }

    /// Executor configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run the loop and return only the final text
    pub async fn run(&self, user_message: String) -> Result<String> {
        Ok(self.execute(user_message).await?.text)
    }

    /// Run the loop on a fresh conversation
    pub async fn execute(&self, user_message: String) -> Result<ExecutionOutcome> {
        self.execute_with_history(Vec::new(), user_message).await
    }

    /// Run the loop with prior conversation history
    pub async fn execute_with_history(
        &self,
        history: Vec<Message>,
        user_message: String,
    ) -> Result<ExecutionOutcome> {
        let mut conversation = history;
        let first = Message::user(user_message);
        self.log_message(&first);
        conversation.push(first);

        let tools = self.tool_definitions();
        let system = self
            .config
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        let mut usage = TokenUsage::default();
        let mut tool_calls = 0;
        let mut tool_failures = Vec::new();

        for iteration in 1..=self.config.max_iterations {
            info!(
                iteration,
                max_iterations = self.config.max_iterations,
                model = %self.config.model,
                tool_count = tools.len(),
                "Sending request to model"
            );

            let mut builder = CompletionRequest::builder(&self.config.model)
                .messages(conversation.clone())
                .system(system.clone())
                .max_tokens(self.config.max_tokens)
                .tools(tools.clone())
                .response_format(self.config.response_format);
            if let Some(temperature) = self.config.temperature {
                builder = builder.temperature(temperature);
            }

            let call = self.provider.complete(builder.build());
            let response = match self.config.call_timeout {
                Some(limit) => tokio::time::timeout(limit, call)
                    .await
                    .map_err(|_| Error::Timeout(limit))??,
                None => call.await?,
            };

            usage += response.usage;
            debug!(
                stop_reason = ?response.stop_reason,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "Model response received"
            );
            self.log_message(&response.message);

            // Some proxies report "stop" alongside tool calls, so the calls
            // themselves decide whether the loop continues.
            if !response.message.has_tool_calls() {
                match response.stop_reason {
                    StopReason::MaxTokens => warn!(iteration, "Model output truncated at max_tokens"),
                    StopReason::ContentFilter => warn!(iteration, "Model output withheld by content filter"),
                    StopReason::EndTurn | StopReason::ToolUse => {}
                }
                let text = response.message.text().unwrap_or_default();
                info!(
                    iteration,
                    response_length = text.len(),
                    tool_calls,
                    failed_tools = tool_failures.len(),
                    "Agent completed"
                );
                return Ok(ExecutionOutcome {
                    text,
                    iterations: iteration,
                    tool_calls,
                    tool_failures,
                    usage,
                    stop_reason: response.stop_reason,
                });
            }

            let calls = response.message.tool_calls();
            tool_calls += calls.len();
            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                let (result, failure) = self.run_tool(call).await;
                self.log_message(&result);
                results.push(result);
                tool_failures.extend(failure);
            }

            conversation.push(response.message);
            conversation.extend(results);
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "Iteration limit reached without a final answer"
        );
        Err(Error::IterationLimit(self.config.max_iterations))
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tool_registry
            .tools()
            .map(|tool| ToolDefinition::new(tool.name(), tool.description(), tool.input_schema()))
            .collect()
    }

    /// Returns the result message for the conversation plus, on failure,
    /// the failure record for the outcome.
    async fn run_tool(&self, call: ToolCall<'_>) -> (Message, Option<ToolFailure>) {
        let input_preview: String = call.input.to_string().chars().take(300).collect();
        info!(tool_name = %call.name, tool_id = %call.id, input_preview = %input_preview, "Executing tool");

        let started = Instant::now();
        match self.tool_registry.execute(call.name, call.input.clone()).await {
            Ok(value) => {
                let payload = value.to_string();
                info!(
                    tool_name = %call.name,
                    duration_ms = started.elapsed().as_millis() as u64,
                    result_length = payload.len(),
                    "Tool execution succeeded"
                );
                (Message::tool_result(call.id, payload), None)
            }
            Err(e) => {
                warn!(
                    tool_name = %call.name,
                    duration_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "Tool execution failed"
                );
                let kind = e.failure_kind();
                let message = match e {
                    Error::ToolFailed { message, .. } => message,
                    other => other.to_string(),
                };
                (
                    Message::tool_error(call.id, format!("Error: {message}")),
                    Some(ToolFailure {
                        tool: call.name.to_string(),
                        kind,
                        message,
                    }),
                )
            }
        }
    }

    fn log_message(&self, message: &Message) {
        if !self.config.log_transcript {
            return;
        }
        let text = message.text().unwrap_or_default();
        let calls: Vec<&str> = message.tool_calls().iter().map(|c| c.name).collect();
        info!(target: "analyst::transcript", role = ?message.role, tool_calls = ?calls, "{text}");
    }
}

/// Builder for AgentExecutor
pub struct AgentExecutorBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    tool_registry: Arc<ToolRegistry>,
    config: ExecutorConfig,
}

impl AgentExecutorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            provider: None,
            tool_registry: Arc::new(ToolRegistry::default()),
            config: ExecutorConfig::default(),
        }
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tool registry
    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = registry;
        self
    }

    /// Set the full configuration
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set maximum iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Set the per-call deadline
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = Some(timeout);
        self
    }

    /// Build the executor
    pub fn build(self) -> Result<AgentExecutor> {
        let provider = self
            .provider
            .ok_or_else(|| Error::InitializationFailed("Provider not set".to_string()))?;

        Ok(AgentExecutor::new(provider, self.tool_registry, self.config))
    }
}

impl Default for AgentExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedProvider, text_reply, tool_reply};
    use analyst_llm::{ContentBlock, LLMError, MessageContent};
    use analyst_tools::Tool;
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct Quote {
        fail: bool,
    }

    #[async_trait]
    impl Tool for Quote {
        async fn execute(&self, params: Value) -> Result<Value> {
            if self.fail {
                return Err(Error::upstream(FailureKind::Unavailable, "quote feed down"));
            }
            Ok(json!({"symbol": params["symbol"], "price": 185.92}))
        }

        fn name(&self) -> &str {
            "quote"
        }

        fn description(&self) -> &str {
            "Latest price"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
    }

    fn executor(provider: Arc<ScriptedProvider>, fail: bool) -> AgentExecutor {
        let registry = ToolRegistry::builder().tool(Arc::new(Quote { fail })).build();
        AgentExecutor::builder()
            .provider(provider)
            .tool_registry(Arc::new(registry))
            .max_iterations(3)
            .system_prompt("Be precise")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(matches!(
            AgentExecutorBuilder::new().model("m").build(),
            Err(Error::InitializationFailed(_))
        ));
        let config = ExecutorConfig::default();
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.model, "gpt-4.1");
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_reply("c1", "quote", json!({"symbol": "AAPL"})),
            text_reply("AAPL trades at 185.92"),
        ]));
        let outcome = executor(provider.clone(), false)
            .execute("Price of AAPL?".into())
            .await
            .unwrap();

        assert_eq!(outcome.text, "AAPL trades at 185.92");
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.tool_calls, 1);
        assert!(outcome.tool_failures.is_empty());
        assert_eq!(outcome.usage.input_tokens, 30);

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].system.as_deref(), Some("Be precise"));
        assert_eq!(requests[0].tools.as_ref().map(Vec::len), Some(1));
        // user, assistant tool call, tool result
        let last = requests[1].messages.last().unwrap();
        match &last.content {
            Some(MessageContent::Blocks(blocks)) => assert!(matches!(
                &blocks[0],
                ContentBlock::ToolResult { content, is_error: false, .. } if content.contains("185.92")
            )),
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tool_failure_is_fed_back() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_reply("c1", "quote", json!({"symbol": "AAPL"})),
            text_reply("No data available"),
        ]));
        let outcome = executor(provider.clone(), true)
            .execute("Price of AAPL?".into())
            .await
            .unwrap();

        assert_eq!(outcome.tool_calls, 1);
        assert_eq!(outcome.tool_failures.len(), 1);
        let failure = &outcome.tool_failures[0];
        assert_eq!(failure.tool, "quote");
        assert_eq!(failure.kind, FailureKind::Unavailable);
        assert!(failure.message.contains("quote feed down"));
    }

    #[tokio::test]
    async fn test_unknown_tool_counts_as_failure() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_reply("c1", "teleport", json!({})),
            text_reply("done"),
        ]));
        let outcome = executor(provider, false).execute("go".into()).await.unwrap();
        assert_eq!(outcome.tool_failures.len(), 1);
        assert_eq!(outcome.tool_failures[0].tool, "teleport");
        assert!(outcome.tool_failures[0].message.starts_with("unknown tool"));
    }

    #[tokio::test]
    async fn test_iteration_limit_is_an_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_reply("c1", "quote", json!({})),
            tool_reply("c2", "quote", json!({})),
            tool_reply("c3", "quote", json!({})),
        ]));
        let err = executor(provider.clone(), false)
            .execute("loop".into())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::IterationLimit(3)));
        assert_eq!(provider.request_count(), 3);
    }

    #[tokio::test]
    async fn test_provider_error_keeps_kind() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(
            LLMError::RateLimitExceeded("slow down".into()),
        )]));
        let err = executor(provider, false).run("hi".into()).await.unwrap_err();
        assert_eq!(err.failure_kind(), FailureKind::RateLimited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_timeout() {
        let provider = Arc::new(
            ScriptedProvider::new(vec![text_reply("late")]).with_delay(Duration::from_secs(30)),
        );
        let executor = AgentExecutor::builder()
            .provider(provider)
            .call_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        let err = executor.run("hi".into()).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(d) if d == Duration::from_secs(5)));
        assert_eq!(err.failure_kind(), FailureKind::Timeout);
    }
}
