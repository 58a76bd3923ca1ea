//! OpenAI-compatible chat completions provider
//!
//! Talks to `POST {api_base}/chat/completions`. Works against OpenAI itself
//! and against any proxy that speaks the same protocol, such as a LiteLLM
//! gateway, which is the preferred deployment for the analyst.
//!
//! ```no_run
//! use analyst_llm::{CompletionRequest, LLMProvider, Message, ResponseFormat};
//! use analyst_llm::providers::OpenAIProvider;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! // LITELLM_BASE_URL / LITELLM_API_KEY, falling back to OPENAI_API_KEY
//! let provider = OpenAIProvider::from_env()?;
//!
//! let request = CompletionRequest::builder("gpt-4.1")
//!     .add_message(Message::user("Summarize AAPL as JSON"))
//!     .response_format(ResponseFormat::JsonObject)
//!     .build();
//!
//! let response = provider.complete(request).await?;
//! println!("{}", response.message.text().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message,
    MessageContent, ResponseFormat, Result, Role, StopReason, TokenUsage, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the OpenAI-compatible provider
#[derive(Clone)]
pub struct OpenAIConfig {
    /// API key sent as a bearer token
    pub api_key: String,

    /// Base URL, without the `/chat/completions` suffix
    pub api_base: String,

    /// Per-request HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl OpenAIConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Create config from the process environment
    ///
    /// A LiteLLM gateway (`LITELLM_BASE_URL` + `LITELLM_API_KEY`) wins over
    /// direct OpenAI access (`OPENAI_API_KEY`, optional `OPENAI_API_BASE`).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let (Some(base), Some(key)) = (non_empty("LITELLM_BASE_URL"), non_empty("LITELLM_API_KEY"))
        {
            return Ok(Self::new(key).with_api_base(base));
        }

        let api_key = non_empty("OPENAI_API_KEY").ok_or_else(|| {
            LLMError::ConfigurationError(
                "set LITELLM_BASE_URL and LITELLM_API_KEY, or OPENAI_API_KEY".to_string(),
            )
        })?;
        let api_base =
            non_empty("OPENAI_API_BASE").unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string());

        Ok(Self::new(api_key).with_api_base(api_base))
    }

    /// Set custom API base URL (a trailing slash is dropped)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a provider with an API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Create a provider from the environment
    pub fn from_env() -> Result<Self> {
        Self::with_config(OpenAIConfig::from_env()?)
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let model = request.model.clone();
        let body = build_request(request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "chat completion request rejected");
            return Err(classify_status(status.as_u16(), model, error_text));
        }

        let parsed: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

        into_completion(parsed)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

fn classify_status(status: u16, model: String, body: String) -> LLMError {
    match status {
        401 | 403 => LLMError::AuthenticationFailed,
        429 => LLMError::RateLimitExceeded(body),
        404 => LLMError::ModelNotFound(model),
        400 | 422 => LLMError::InvalidRequest(body),
        408 | 500..=599 => LLMError::ServiceUnavailable(format!("HTTP {status}: {body}")),
        _ => LLMError::RequestFailed(format!("HTTP {status}: {body}")),
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAIResponseFormat>,
}

#[derive(Debug, Serialize)]
struct OpenAIResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAIMessage {
    fn text(role: &'static str, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: OpenAIFunction,
}

#[derive(Debug, Serialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    tool_type: String,
    function: OpenAIFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

// ============================================================================
// Conversion
// ============================================================================

fn build_request(request: CompletionRequest) -> OpenAIRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(system) = request.system {
        messages.push(OpenAIMessage::text("system", system));
    }
    for msg in request.messages {
        messages.extend(convert_message(msg));
    }

    OpenAIRequest {
        model: request.model,
        messages,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        tools: request.tools.as_deref().map(convert_tools),
        response_format: match request.response_format {
            ResponseFormat::Text => None,
            ResponseFormat::JsonObject => Some(OpenAIResponseFormat {
                format_type: "json_object",
            }),
        },
    }
}

/// One message may expand into several: tool results travel as `tool` role
/// messages of their own.
fn convert_message(msg: Message) -> Vec<OpenAIMessage> {
    let role = match msg.role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    };

    let blocks = match msg.content {
        Some(MessageContent::Text(text)) => return vec![OpenAIMessage::text(role, text)],
        None => return vec![OpenAIMessage::text(role, String::new())],
        Some(MessageContent::Blocks(blocks)) => blocks,
    };

    let mut texts = Vec::new();
    let mut tool_calls = Vec::new();
    let mut results = Vec::new();

    for block in blocks {
        match block {
            ContentBlock::Text { text } => texts.push(text),
            ContentBlock::ToolUse { id, name, input } => tool_calls.push(OpenAIToolCall {
                id,
                tool_type: function_type(),
                function: OpenAIFunctionCall {
                    name,
                    arguments: input.to_string(),
                },
            }),
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                ..
            } => results.push(OpenAIMessage {
                role: "tool",
                content: Some(content),
                tool_calls: None,
                tool_call_id: Some(tool_use_id),
            }),
        }
    }

    let mut out = Vec::with_capacity(results.len() + 1);
    if !texts.is_empty() || !tool_calls.is_empty() {
        out.push(OpenAIMessage {
            role,
            content: (!texts.is_empty()).then(|| texts.join("\n")),
            tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            tool_call_id: None,
        });
    }
    out.extend(results);
    out
}

fn convert_tools(tools: &[ToolDefinition]) -> Vec<OpenAITool> {
    tools
        .iter()
        .map(|tool| OpenAITool {
            tool_type: "function",
            function: OpenAIFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        })
        .collect()
}

fn into_completion(response: OpenAIResponse) -> Result<CompletionResponse> {
    let usage = response
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

    let finish_reason = choice.finish_reason.as_deref().unwrap_or("stop");
    debug!(
        finish_reason,
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        "received completion"
    );

    let mut blocks = Vec::new();
    if let Some(content) = choice.message.content.filter(|c| !c.is_empty()) {
        blocks.push(ContentBlock::Text { text: content });
    }
    for call in choice.message.tool_calls.unwrap_or_default() {
        let input = if call.function.arguments.trim().is_empty() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(&call.function.arguments).map_err(|e| {
                LLMError::UnexpectedResponse(format!(
                    "tool '{}' arguments are not JSON: {e}",
                    call.function.name
                ))
            })?
        };
        blocks.push(ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        });
    }

    Ok(CompletionResponse {
        message: Message::assistant_blocks(blocks),
        stop_reason: map_stop_reason(finish_reason),
        usage,
    })
}

fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "stop" => StopReason::EndTurn,
        "length" => StopReason::MaxTokens,
        "tool_calls" | "function_call" => StopReason::ToolUse,
        "content_filter" => StopReason::ContentFilter,
        other => {
            debug!(reason = other, "unmapped finish reason");
            StopReason::EndTurn
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_litellm_preferred_over_openai() {
        let config = OpenAIConfig::from_lookup(lookup(&[
            ("LITELLM_BASE_URL", "http://localhost:4000/"),
            ("LITELLM_API_KEY", "sk-proxy"),
            ("OPENAI_API_KEY", "sk-direct"),
        ]))
        .unwrap();
        assert_eq!(config.api_base, "http://localhost:4000");
        assert_eq!(config.api_key, "sk-proxy");
    }

    #[test]
    fn test_openai_fallback_and_missing_key() {
        let config = OpenAIConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-direct")])).unwrap();
        assert_eq!(config.api_base, DEFAULT_OPENAI_API_BASE);

        let err = OpenAIConfig::from_lookup(lookup(&[("LITELLM_BASE_URL", "http://x")])).unwrap_err();
        assert!(matches!(err, LLMError::ConfigurationError(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", OpenAIConfig::new("sk-secret"));
        assert!(!rendered.contains("sk-secret"));
    }

    #[test]
    fn test_request_shape() {
        let request = CompletionRequest::builder("gpt-4.1")
            .system("Be terse")
            .add_message(Message::user("AAPL?"))
            .add_message(Message::assistant_blocks(vec![ContentBlock::ToolUse {
                id: "call_1".into(),
                name: "web_search".into(),
                input: json!({"query": "AAPL earnings"}),
            }]))
            .add_message(Message::tool_error("call_1", "timeout"))
            .response_format(ResponseFormat::JsonObject)
            .build();

        let body = serde_json::to_value(build_request(request)).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[2]["tool_calls"][0]["function"]["name"], "web_search");
        assert!(messages[2].get("content").is_none());
        assert_eq!(messages[3]["role"], "tool");
        assert_eq!(messages[3]["tool_call_id"], "call_1");
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_parse_tool_call_response() {
        let raw = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_9",
                        "type": "function",
                        "function": {"name": "web_search", "arguments": "{\"query\":\"MSFT\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 7}
        });
        let response = into_completion(serde_json::from_value(raw).unwrap()).unwrap();
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.usage.total(), 19);
        let calls = response.message.tool_calls();
        assert_eq!(calls[0].id, "call_9");
        assert_eq!(calls[0].input["query"], "MSFT");
    }

    #[test]
    fn test_bad_arguments_and_empty_choices() {
        let raw = json!({
            "choices": [{
                "message": {
                    "content": "",
                    "tool_calls": [{"id": "c", "function": {"name": "x", "arguments": "{oops"}}]
                },
                "finish_reason": "tool_calls"
            }]
        });
        let err = into_completion(serde_json::from_value(raw).unwrap()).unwrap_err();
        assert!(matches!(err, LLMError::UnexpectedResponse(_)));

        let empty: OpenAIResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(into_completion(empty).is_err());
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            classify_status(401, "m".into(), String::new()),
            LLMError::AuthenticationFailed
        ));
        assert!(matches!(
            classify_status(429, "m".into(), String::new()),
            LLMError::RateLimitExceeded(_)
        ));
        assert!(matches!(
            classify_status(404, "gpt-x".into(), String::new()),
            LLMError::ModelNotFound(m) if m == "gpt-x"
        ));
        assert!(matches!(
            classify_status(503, "m".into(), String::new()),
            LLMError::ServiceUnavailable(_)
        ));
    }
}
