//! Core Agent trait definition

use crate::{Context, Result};
use async_trait::async_trait;

/// A unit of work that turns a textual request into a textual response
///
/// Everything a transport layer (CLI, chat bot, HTTP agent-interop server)
/// needs to drive an analyst is this trait. Structured results are carried
/// as serialized JSON in the returned string.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Handle one request
    ///
    /// Implementations may record request metadata (request id, symbol) in
    /// `context` so the caller can correlate logs and responses.
    async fn process(&self, input: String, context: &mut Context) -> Result<String>;

    /// Stable agent name, used in logs and tool registries
    fn name(&self) -> &str;

    /// One-line summary of what the agent does
    fn description(&self) -> &str {
        ""
    }
}
