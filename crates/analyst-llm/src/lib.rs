//! Model access for the stock analyst
//!
//! The conversation types ([`Message`], [`ContentBlock`]), one-call request
//! and response types, tool definitions offered to the model, and the
//! [`LLMProvider`] seam. The bundled provider speaks the OpenAI chat
//! completions API, either directly or through a LiteLLM proxy.

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod tools;

pub use completion::{
    CompletionRequest, CompletionRequestBuilder, CompletionResponse, ResponseFormat, StopReason,
    TokenUsage,
};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role, ToolCall};
pub use provider::LLMProvider;
pub use tools::ToolDefinition;

#[cfg(feature = "openai")]
pub mod providers;
