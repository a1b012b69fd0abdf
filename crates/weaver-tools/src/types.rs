//! Shared tool types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A command for the frontend to execute, produced by UI-facing tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiCommand {
    pub command: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl UiCommand {
    pub fn new(command: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

/// Tool definition in OpenAI function-calling format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDef,
}

impl ToolDefinition {
    /// Convert to Claude API format: `{ name, description, input_schema }`.
    pub fn to_claude_format(&self) -> Value {
        serde_json::json!({
            "name": self.function.name,
            "description": self.function.description,
            "input_schema": self.function.parameters
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Result from executing a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool_name: String,
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn ok(tool_name: &str, content: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            content: content.into(),
            is_error: false,
        }
    }
}

/// Narrow tool interface consumed by the agent's tool-calling layer.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters(&self) -> Value;

    async fn execute(&self, args: Map<String, Value>) -> ToolResult;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDef {
                name: self.name().to_string(),
                description: self.description().to_string(),
                parameters: self.parameters(),
            },
        }
    }
}
