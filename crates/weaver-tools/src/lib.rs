//! Weaver agent tools.
//!
//! - **types**: `Tool` interface, `ToolDefinition`, `ToolResult`, `UiCommand`
//! - **canvas**: `CanvasTool`, the UI command queue drained after each chat turn

mod canvas;
mod types;

pub use canvas::CanvasTool;
pub use types::{FunctionDef, Tool, ToolDefinition, ToolResult, UiCommand};
