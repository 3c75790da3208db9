use lecture_notes_core::NoteService;
use serde_json::json;

use super::{ToolDefinition, ToolResult};

pub fn definitions() -> Vec<ToolDefinition> {
    vec![ToolDefinition {
        name: "list-courses".to_string(),
        description: "List configured courses with their notes and transcript directories".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
    }]
}

pub fn call(service: &NoteService) -> ToolResult {
    ToolResult::text(service.list_courses())
}
