use lecture_notes_core::NoteService;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::panic::{self, AssertUnwindSafe};

use crate::tools::{call_tool, list_tools, ToolResult};
use crate::transport::{
    JsonRpcRequest, JsonRpcResponse, ToolCallParams, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND, PARSE_ERROR,
};

const SERVER_NAME: &str = "lecture-notes-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

pub struct McpServer {
    initialized: bool,
    service: NoteService,
}

impl McpServer {
    pub fn new(service: NoteService) -> Self {
        Self {
            initialized: false,
            service,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Serve newline-delimited requests until `reader` hits EOF. Lines that
    /// are not UTF-8 get a parse error; only I/O failures end the loop.
    pub fn serve<R: BufRead, W: Write>(&mut self, mut reader: R, mut writer: W) -> io::Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(());
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_request(line),
                Err(e) => {
                    log::warn!("request is not valid UTF-8: {}", e);
                    Some(JsonRpcResponse::error(None, PARSE_ERROR, "Parse error").encode())
                }
            };

            if let Some(resp) = response {
                writeln!(writer, "{}", resp)?;
                writer.flush()?;
            }
        }
    }

    /// Handle one line of input. Notifications produce no output.
    pub fn handle_request(&mut self, input: &str) -> Option<String> {
        let value: Value = match serde_json::from_str(input) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("unparseable request: {}", e);
                return Some(JsonRpcResponse::error(None, PARSE_ERROR, "Parse error").encode());
            }
        };

        let id = value.get("id").cloned().filter(|id| !id.is_null());
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                return Some(
                    JsonRpcResponse::error(id, INVALID_REQUEST, format!("Invalid request: {}", e))
                        .encode(),
                )
            }
        };

        log::debug!("<- {}", request.method);

        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(&request),
            "tools/list" => self.handle_tools_list(&request),
            "tools/call" => self.handle_tools_call(&request),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            _ => JsonRpcResponse::error(
                request.id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };

        Some(response.encode())
    }

    fn handle_notification(&mut self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "initialized" | "notifications/initialized" => {
                self.initialized = true;
                log::info!("client initialized");
            }
            other => log::debug!("ignoring notification {}", other),
        }
    }

    fn handle_initialize(&mut self, request: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(
            request.id.clone(),
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": SERVER_VERSION
                }
            }),
        )
    }

    fn handle_tools_list(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let tools = list_tools();
        JsonRpcResponse::success(request.id.clone(), json!({ "tools": tools }))
    }

    fn handle_tools_call(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let parsed = request
            .params
            .clone()
            .map(serde_json::from_value::<ToolCallParams>);
        let params = match parsed {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    request.id.clone(),
                    INVALID_PARAMS,
                    format!("Invalid params: {}", e),
                )
            }
            None => {
                return JsonRpcResponse::error(request.id.clone(), INVALID_PARAMS, "Missing params")
            }
        };

        let arguments = params.arguments.unwrap_or_else(|| json!({}));
        log::info!("tool call: {}", params.name);

        let service = &self.service;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            call_tool(service, &params.name, arguments)
        }));

        match outcome {
            Ok(Ok(result)) => JsonRpcResponse::success(request.id.clone(), result.to_value()),
            Ok(Err(e)) => JsonRpcResponse::error(request.id.clone(), INVALID_PARAMS, e),
            Err(payload) => {
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                log::error!("tool {} panicked: {}", params.name, detail);
                JsonRpcResponse::success(
                    request.id.clone(),
                    ToolResult::error(format!(
                        "Unexpected internal error in {}: {}",
                        params.name, detail
                    ))
                    .to_value(),
                )
            }
        }
    }
}
