//! Tool trait definition

use analyst_core::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A function the model can call
///
/// `execute` receives the arguments the model produced, which should match
/// [`input_schema`](Tool::input_schema) but are not guaranteed to. Tools
/// validate their own input and report problems as errors; the executor
/// turns those into error results the model can read.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Run the tool
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Name the model calls the tool by; unique within a registry
    fn name(&self) -> &str;

    /// Tells the model when the tool is useful
    fn description(&self) -> &str;

    /// JSON Schema of the arguments
    fn input_schema(&self) -> Value;
}
