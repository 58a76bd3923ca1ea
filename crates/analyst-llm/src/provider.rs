//! Provider seam

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// A chat model behind some API
///
/// Stateless per call: the whole conversation goes in, the next assistant
/// message comes out. Tool loops live in the runtime's executor.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Short provider id for logs, e.g. "openai"
    fn name(&self) -> &str;
}
