mod courses;
mod notes;

use lecture_notes_core::NoteService;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Outcome of a tool call. Failures are still successful JSON-RPC
/// responses, flagged with `isError`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub text: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "content": [{
                "type": "text",
                "text": self.text
            }],
            "isError": self.is_error
        })
    }
}

pub fn list_tools() -> Vec<ToolDefinition> {
    let mut tools = Vec::new();
    tools.extend(courses::definitions());
    tools.extend(notes::definitions());
    tools
}

/// `Err` only for names no tool answers to.
pub fn call_tool(service: &NoteService, name: &str, arguments: Value) -> Result<ToolResult, String> {
    match name {
        "list-courses" => Ok(courses::call(service)),
        "generate-notes-from-source" => Ok(notes::call(service, arguments)),
        _ => Err(format!("unknown tool: {}", name)),
    }
}
