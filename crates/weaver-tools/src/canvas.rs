//! Canvas tool: queues UI commands for the Nest frontend.
//!
//! The agent calls `execute` during a turn; whoever owns the turn calls
//! `drain` afterwards and ships the commands with the reply.

use serde_json::{json, Map, Value};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::types::{Tool, ToolResult, UiCommand};

const TOOL_NAME: &str = "canvas";

/// Append-only UI command buffer, drained atomically.
#[derive(Debug, Default)]
pub struct CanvasTool {
    commands: Mutex<Vec<UiCommand>>,
}

impl CanvasTool {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self) -> MutexGuard<'_, Vec<UiCommand>> {
        // Entries are pushed whole, so a poisoned queue is still consistent.
        self.commands.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a command. The action is not validated against the schema enum.
    pub fn enqueue(&self, command: impl Into<String>, args: Map<String, Value>) -> String {
        let cmd = UiCommand::new(command, args);
        let confirmation = format!("UI action {:?} queued for execution", cmd.command);
        tracing::debug!(command = %cmd.command, "Queued UI command");
        self.queue().push(cmd);
        confirmation
    }

    /// Take every queued command in FIFO order, leaving the queue empty.
    pub fn drain(&self) -> Vec<UiCommand> {
        std::mem::take(&mut *self.queue())
    }

    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }
}

#[async_trait::async_trait]
impl Tool for CanvasTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Control the Nest UI interface (create nodes, organize canvas, etc.)"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "description": "Action to perform",
                    "enum": ["create_node", "update_node", "delete_node", "clear"]
                },
                "type": {
                    "type": "string",
                    "description": "Type of node (text, code, image, video)",
                    "enum": ["text", "code", "image", "video"]
                },
                "title": {
                    "type": "string",
                    "description": "Title of the node"
                },
                "content": {
                    "type": "string",
                    "description": "Content of the node (Markdown, code, or URL)"
                },
                "id": {
                    "type": "string",
                    "description": "ID of the node (for update/delete)"
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, args: Map<String, Value>) -> ToolResult {
        let action = args
            .get("action")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let confirmation = self.enqueue(action, args);
        ToolResult::ok(TOOL_NAME, confirmation)
    }
}
