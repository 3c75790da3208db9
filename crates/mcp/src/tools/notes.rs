use lecture_notes_core::NoteService;
use serde_json::{json, Value};

use super::{ToolDefinition, ToolResult};

pub fn definitions() -> Vec<ToolDefinition> {
    vec![ToolDefinition {
        name: "generate-notes-from-source".to_string(),
        description: "Fetch a lecture transcript from a local file, a video, or an HTTP API, optionally save it, and render Markdown notes for the course".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "courseName": {
                    "type": "string",
                    "description": "Course name; selects the notes and transcript directories"
                },
                "lectureNumber": {
                    "type": ["string", "integer"],
                    "description": "Lecture number, used in generated file names"
                },
                "lectureTopic": {
                    "type": "string",
                    "description": "Topic of the lecture"
                },
                "sourceType": {
                    "type": "string",
                    "enum": ["local-file", "remote-video", "http-api"],
                    "description": "Where the transcript comes from"
                },
                "sourceLocation": {
                    "type": "string",
                    "description": "File path (absolute or relative to the course transcript directory), video URL/ID, or API URL"
                },
                "apiMethod": {
                    "type": "string",
                    "enum": ["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD"],
                    "description": "HTTP method for http-api sources (default GET)"
                },
                "apiHeaders": {
                    "type": ["object", "string"],
                    "additionalProperties": { "type": "string" },
                    "description": "HTTP headers as an object, or a JSON-encoded object"
                },
                "apiBody": {
                    "description": "Request body for http-api sources (string or JSON)"
                },
                "outputDirectory": {
                    "type": "string",
                    "description": "Directory for the note (relative paths are under the course notes directory)"
                },
                "outputFilename": {
                    "type": "string",
                    "description": "Note file name (default <Course>-Lecture-<n>.md)"
                },
                "saveTranscript": {
                    "type": "boolean",
                    "description": "Save fetched transcripts to the course transcript directory (default true)"
                },
                "transcriptFilename": {
                    "type": "string",
                    "description": "File name for the saved transcript (default <Course>-Lecture-<n>-YT.txt or -API.txt)"
                },
                "specialFormatting": {
                    "type": "string",
                    "description": "Formatting requests for the note"
                },
                "contentToEmphasize": {
                    "type": "string",
                    "description": "Material the note should emphasize"
                },
                "otherInstructions": {
                    "type": "string",
                    "description": "Any other instructions for the note renderer"
                }
            },
            "required": ["courseName", "lectureNumber", "lectureTopic", "sourceType", "sourceLocation"]
        }),
    }]
}

pub fn call(service: &NoteService, arguments: Value) -> ToolResult {
    match service.generate_from_arguments(arguments) {
        Ok(summary) => ToolResult::text(summary.render()),
        Err(e) => {
            log::error!("generate-notes-from-source failed: {}", e);
            ToolResult::error(format!("Failed to generate notes. {}", e))
        }
    }
}
