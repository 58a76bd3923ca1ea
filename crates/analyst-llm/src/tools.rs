//! Tool definition types for LLM tool use

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition advertised to the model
///
/// `input_schema` is a JSON Schema object describing the arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match the registered tool)
    pub name: String,

    /// Description the model uses to decide when to call the tool
    pub description: String,

    /// JSON schema for the tool's input parameters
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Helpers for building JSON schemas for tool inputs
pub mod schema {
    use serde_json::{Value, json};

    /// Object schema with properties and required keys
    ///
    /// # Example
    ///
    /// ```
    /// use analyst_llm::tools::schema;
    /// use serde_json::json;
    ///
    /// let schema = schema::object(
    ///     json!({
    ///         "query": schema::string("Search query"),
    ///         "max_results": schema::integer("Maximum results"),
    ///     }),
    ///     &["query"],
    /// );
    /// assert_eq!(schema["required"][0], "query");
    /// ```
    pub fn object(properties: Value, required: &[&str]) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// String property schema
    pub fn string(description: &str) -> Value {
        json!({ "type": "string", "description": description })
    }

    /// String property restricted to a fixed set of values
    pub fn string_enum(description: &str, values: &[&str]) -> Value {
        json!({ "type": "string", "description": description, "enum": values })
    }

    /// Number property schema
    pub fn number(description: &str) -> Value {
        json!({ "type": "number", "description": description })
    }

    /// Integer property schema
    pub fn integer(description: &str) -> Value {
        json!({ "type": "integer", "description": description })
    }

    /// Boolean property schema
    pub fn boolean(description: &str) -> Value {
        json!({ "type": "boolean", "description": description })
    }

    /// Array property schema
    pub fn array(description: &str, items: Value) -> Value {
        json!({ "type": "array", "description": description, "items": items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_definition() {
        let input = schema::object(json!({ "symbol": schema::string("Ticker") }), &["symbol"]);
        let tool = ToolDefinition::new("stock_report", "Analyze a stock", input.clone());
        assert_eq!(tool.name, "stock_report");
        assert_eq!(tool.input_schema, input);
    }

    #[test]
    fn test_schema_builders() {
        assert_eq!(schema::number("price")["type"], "number");
        assert_eq!(schema::boolean("flag")["type"], "boolean");

        let depth = schema::string_enum("Search depth", &["basic", "advanced"]);
        assert_eq!(depth["enum"], json!(["basic", "advanced"]));

        let list = schema::array("Symbols", schema::string("Ticker"));
        assert_eq!(list["items"]["type"], "string");
    }
}
