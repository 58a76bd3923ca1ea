//! Per-request context for agents
//!
//! A `Context` travels with one request through an [`Agent`](crate::Agent).
//! Transport adapters seed it (request id, preferred analysis mode) and
//! agents write back what they resolved (normalized symbol).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known context keys
pub mod keys {
    /// Correlation id for logs and responses
    pub const REQUEST_ID: &str = "request_id";
    /// Normalized ticker the request resolved to
    pub const SYMBOL: &str = "symbol";
    /// Requested analysis mode ("workflow" or "single")
    pub const ANALYSIS_MODE: &str = "analysis_mode";
}

/// Context passed to agents during execution
///
/// # Example
///
/// ```
/// use analyst_core::Context;
///
/// let ctx = Context::new()
///     .with_request_id("req-1")
///     .with_analysis_mode("single");
///
/// assert_eq!(ctx.request_id(), Some("req-1"));
/// assert_eq!(ctx.analysis_mode(), Some("single"));
/// assert_eq!(ctx.symbol(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    data: HashMap<String, serde_json::Value>,
}

impl Context {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request id
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.insert(keys::REQUEST_ID, serde_json::json!(request_id.into()));
        self
    }

    /// Set the requested analysis mode
    pub fn with_analysis_mode(mut self, mode: impl Into<String>) -> Self {
        self.insert(keys::ANALYSIS_MODE, serde_json::json!(mode.into()));
        self
    }

    /// Request id, if one was assigned
    pub fn request_id(&self) -> Option<&str> {
        self.str_value(keys::REQUEST_ID)
    }

    /// Normalized symbol, once an agent resolved it
    pub fn symbol(&self) -> Option<&str> {
        self.str_value(keys::SYMBOL)
    }

    /// Record the normalized symbol
    pub fn set_symbol(&mut self, symbol: impl Into<String>) {
        self.insert(keys::SYMBOL, serde_json::json!(symbol.into()));
    }

    /// Requested analysis mode
    pub fn analysis_mode(&self) -> Option<&str> {
        self.str_value(keys::ANALYSIS_MODE)
    }

    fn str_value(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(serde_json::Value::as_str)
    }

    /// Insert a raw JSON value
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a raw JSON value
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Serialize `value` and store it under `key`
    pub fn insert_typed<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> crate::Result<()> {
        let json_value = serde_json::to_value(value).map_err(|e| {
            crate::Error::ProcessingFailed(format!("context value is not serializable: {e}"))
        })?;
        self.data.insert(key.into(), json_value);
        Ok(())
    }

    /// Deserialize the value stored under `key`
    pub fn get_typed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> crate::Result<Option<T>> {
        self.data
            .get(key)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|e| {
                    crate::Error::ProcessingFailed(format!("context value '{key}' has wrong shape: {e}"))
                })
            })
            .transpose()
    }

    /// Check if a key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the context is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Merge another context into this one (other values override)
    pub fn merge(&mut self, other: Context) {
        self.data.extend(other.data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Budget {
        max_calls: u32,
    }

    #[test]
    fn test_symbol_round_trip() {
        let mut ctx = Context::new().with_request_id("abc");
        assert!(ctx.symbol().is_none());

        ctx.set_symbol("MSFT");
        assert_eq!(ctx.symbol(), Some("MSFT"));
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_typed_values() {
        let mut ctx = Context::new();
        ctx.insert_typed("budget", &Budget { max_calls: 4 }).unwrap();

        let budget: Budget = ctx.get_typed("budget").unwrap().unwrap();
        assert_eq!(budget, Budget { max_calls: 4 });

        let missing: Option<Budget> = ctx.get_typed("nope").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_wrong_shape_is_an_error() {
        let mut ctx = Context::new();
        ctx.insert("budget", serde_json::json!("lots"));
        assert!(ctx.get_typed::<Budget>("budget").is_err());
    }

    #[test]
    fn test_merge_overrides() {
        let mut base = Context::new().with_analysis_mode("workflow");
        base.merge(Context::new().with_analysis_mode("single").with_request_id("r"));

        assert_eq!(base.analysis_mode(), Some("single"));
        assert_eq!(base.request_id(), Some("r"));
        assert!(base.contains_key(keys::REQUEST_ID));
    }
}
