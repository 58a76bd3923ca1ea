//! Model-call collaborator
//!
//! Every stage talks to the model through [`ModelRunner`], so the pipeline
//! can be driven by scripted mocks in tests and by the tool-calling
//! executor in production.

use crate::error::{AnalysisError, Stage};
use analyst_core::{FailureKind, Result};
use analyst_llm::ResponseFormat;
use analyst_runtime::{AgentRuntime, ToolFailure};
use analyst_tools::ToolRegistry;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One model call
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Stage the call belongs to
    pub stage: Stage,
    /// System instructions
    pub instructions: String,
    /// User message
    pub input: String,
    /// Tools the model may call; `None` binds no tools
    pub tools: Option<Arc<ToolRegistry>>,
    /// Ask the provider for a JSON object answer
    pub json_output: bool,
}

/// What the model answered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelReply {
    /// Final text
    pub text: String,
    /// Tool calls made during the run
    pub tool_calls: usize,
    /// Tool calls that failed, in call order
    pub tool_failures: Vec<ToolFailure>,
}

impl ModelReply {
    /// Reply without tool activity
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// The model used tools and every call failed
    pub fn tools_exhausted(&self) -> bool {
        self.tool_calls > 0 && self.tool_failures.len() >= self.tool_calls
    }
}

/// Runs a model call to completion, tool calls included
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelRunner: Send + Sync {
    /// Run one request
    async fn run(&self, request: ModelRequest) -> Result<ModelReply>;
}

/// [`ModelRunner`] backed by the tool-calling executor
pub struct ExecutorModelRunner {
    runtime: Arc<AgentRuntime>,
}

impl ExecutorModelRunner {
    /// Create a runner over a shared runtime
    pub fn new(runtime: Arc<AgentRuntime>) -> Self {
        Self { runtime }
    }
}

impl fmt::Debug for ExecutorModelRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorModelRunner")
            .field("model", &self.runtime.config().model)
            .finish()
    }
}

#[async_trait]
impl ModelRunner for ExecutorModelRunner {
    async fn run(&self, request: ModelRequest) -> Result<ModelReply> {
        let format = if request.json_output {
            ResponseFormat::JsonObject
        } else {
            ResponseFormat::Text
        };
        let config = self
            .runtime
            .executor_config()
            .with_system_prompt(request.instructions)
            .with_response_format(format);
        let tools = request.tools.unwrap_or_default();

        let outcome = self.runtime.executor(tools, config).execute(request.input).await?;
        debug!(
            stage = %request.stage,
            iterations = outcome.iterations,
            tool_calls = outcome.tool_calls,
            tokens = outcome.usage.total(),
            "model call finished"
        );

        Ok(ModelReply {
            text: outcome.text,
            tool_calls: outcome.tool_calls,
            tool_failures: outcome.tool_failures,
        })
    }
}

/// Run one stage under its deadline and classify the failure
///
/// A stage whose research calls all failed is reported as a research
/// failure carrying the last tool error.
pub(crate) async fn run_stage(
    runner: &dyn ModelRunner,
    request: ModelRequest,
    symbol: &str,
    deadline: Duration,
) -> std::result::Result<ModelReply, AnalysisError> {
    let stage = request.stage;
    info!(symbol, stage = %stage, "stage started");

    let reply = match tokio::time::timeout(deadline, runner.run(request)).await {
        Ok(Ok(reply)) => reply,
        Ok(Err(e)) => {
            warn!(symbol, stage = %stage, kind = %e.failure_kind(), error = %e, "stage failed");
            return Err(AnalysisError::upstream(symbol, stage, &e));
        }
        Err(_) => {
            warn!(symbol, stage = %stage, ?deadline, "stage timed out");
            return Err(AnalysisError::UpstreamCall {
                symbol: symbol.to_string(),
                stage,
                kind: FailureKind::Timeout,
                message: format!("no answer within {deadline:?}"),
            });
        }
    };

    if reply.tools_exhausted() {
        let (kind, message) = reply.tool_failures.last().map_or_else(
            || (FailureKind::Other, "every research call failed".to_string()),
            |f| (f.kind, f.message.clone()),
        );
        warn!(symbol, stage = %stage, calls = reply.tool_calls, %kind, "every research call failed");
        return Err(AnalysisError::UpstreamCall {
            symbol: symbol.to_string(),
            stage: Stage::Research,
            kind,
            message,
        });
    }

    info!(
        symbol,
        stage = %stage,
        tool_calls = reply.tool_calls,
        failed_tool_calls = reply.tool_failures.len(),
        "stage finished"
    );
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedModel, says};
    use analyst_core::Error;
    use analyst_runtime::RuntimeConfig;

    fn request(stage: Stage) -> ModelRequest {
        ModelRequest {
            stage,
            instructions: "be brief".to_string(),
            input: "AAPL".to_string(),
            tools: None,
            json_output: true,
        }
    }

    fn failure(kind: FailureKind) -> ToolFailure {
        ToolFailure {
            tool: "web_search".to_string(),
            kind,
            message: format!("search {kind}"),
        }
    }

    #[tokio::test]
    async fn test_executor_runner_passes_instructions_and_format() {
        let provider = Arc::new(ScriptedModel::new(vec![says("{\"ok\": true}")]));
        let runtime = AgentRuntime::new(provider.clone(), RuntimeConfig::default());
        let runner = ExecutorModelRunner::new(Arc::new(runtime));

        let reply = runner.run(request(Stage::Recommendation)).await.unwrap();
        assert_eq!(reply.text, "{\"ok\": true}");
        assert_eq!(reply.tool_calls, 0);

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].system.as_deref(), Some("be brief"));
        assert_eq!(seen[0].response_format, ResponseFormat::JsonObject);
        assert!(seen[0].tools.is_none());
    }

    #[tokio::test]
    async fn test_stage_error_is_classified() {
        let mut runner = MockModelRunner::new();
        runner
            .expect_run()
            .returning(|_| Err(Error::upstream(FailureKind::RateLimited, "429")));

        let err = run_stage(&runner, request(Stage::Analysis), "AAPL", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Analysis));
        assert_eq!(err.failure_kind(), Some(FailureKind::RateLimited));
    }

    #[tokio::test]
    async fn test_all_research_failed() {
        let mut runner = MockModelRunner::new();
        runner.expect_run().returning(|_| {
            Ok(ModelReply {
                text: "{}".to_string(),
                tool_calls: 2,
                tool_failures: vec![failure(FailureKind::Network), failure(FailureKind::Authentication)],
            })
        });

        let err = run_stage(&runner, request(Stage::Analysis), "AAPL", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Research));
        assert_eq!(err.failure_kind(), Some(FailureKind::Authentication));
    }

    #[tokio::test]
    async fn test_partial_research_failure_is_fine() {
        let mut runner = MockModelRunner::new();
        runner.expect_run().returning(|_| {
            Ok(ModelReply {
                text: "{}".to_string(),
                tool_calls: 3,
                tool_failures: vec![failure(FailureKind::Network)],
            })
        });

        let reply = run_stage(&runner, request(Stage::Analysis), "AAPL", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(reply.tool_failures.len(), 1);
    }
}
