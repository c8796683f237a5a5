//! MCP server with stdio transport
//!
//! Reads newline-delimited JSON-RPC 2.0 messages from stdin and writes
//! responses to stdout. Each request is handled on its own task so slow
//! queries do not block other tool calls; responses are written in
//! completion order and matched by id. A request whose task panics gets no
//! response but does not stall shutdown.

use super::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};
use super::tools::ToolHandler;
use crate::error::Result;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// MCP protocol revision advertised during `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP server that handles JSON-RPC requests over stdio
pub struct McpServer {
    tool_handler: Arc<ToolHandler>,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(tool_handler: ToolHandler) -> Self {
        Self {
            tool_handler: Arc::new(tool_handler),
        }
    }

    /// Serve stdin/stdout until EOF
    pub async fn run(&self) -> Result<()> {
        info!("MCP server started, listening on stdin...");
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.run_with(reader, writer).await?;
        info!("MCP server shutting down");
        Ok(())
    }

    /// Serve an arbitrary line-oriented transport until EOF and all in-flight calls finish
    pub async fn run_with<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut tasks: JoinSet<Option<JsonRpcResponse>> = JoinSet::new();
        let mut lines = reader.lines();
        let mut reading = true;

        loop {
            if !reading && tasks.is_empty() {
                break;
            }

            tokio::select! {
                line = lines.next_line(), if reading => match line {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }
                        debug!("Received request: {}", line);

                        let handler = self.tool_handler.clone();
                        tasks.spawn(async move { process_request(&handler, &line).await });
                    }
                    Ok(None) => {
                        debug!("Received EOF, shutting down");
                        reading = false;
                    }
                    Err(e) => {
                        error!("Failed to read from stdin: {}", e);
                        reading = false;
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => match joined {
                    Ok(Some(response)) => write_response(&mut writer, &response).await?,
                    Ok(None) => {}
                    Err(e) => error!("Request task failed: {}", e),
                }
            }
        }

        Ok(())
    }
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response_json = match serde_json::to_string(response) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            serde_json::to_string(&JsonRpcResponse::error(
                response.id.clone(),
                JsonRpcError::internal_error(format!("Serialization error: {}", e)),
            ))?
        }
    };

    debug!("Sending response: {}", response_json);

    writer.write_all(response_json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Process a single JSON-RPC message; notifications yield no response
async fn process_request(handler: &ToolHandler, line: &str) -> Option<JsonRpcResponse> {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(req) => req,
        Err(e) => {
            return Some(JsonRpcResponse::error(
                None,
                JsonRpcError::parse_error(format!("Invalid JSON: {}", e)),
            ));
        }
    };

    if request.is_notification() {
        debug!("Received notification: {}", request.method);
        return None;
    }

    if request.jsonrpc != JSONRPC_VERSION {
        return Some(JsonRpcResponse::error(
            request.id.clone(),
            JsonRpcError::invalid_request("jsonrpc must be '2.0'"),
        ));
    }

    Some(match request.method.as_str() {
        "initialize" => handle_initialize(request),
        "ping" => JsonRpcResponse::success(request.id, serde_json::json!({})),
        "tools/list" => handle_tools_list(handler, request),
        "tools/call" => handle_tools_call(handler, request).await,
        _ => JsonRpcResponse::error(request.id, JsonRpcError::method_not_found(&request.method)),
    })
}

fn handle_initialize(request: JsonRpcRequest) -> JsonRpcResponse {
    debug!("Handling initialize");

    JsonRpcResponse::success(
        request.id,
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": "neo4j-mcp",
                "version": env!("CARGO_PKG_VERSION")
            },
            "capabilities": {
                "tools": {}
            }
        }),
    )
}

fn handle_tools_list(handler: &ToolHandler, request: JsonRpcRequest) -> JsonRpcResponse {
    debug!("Handling tools/list");

    JsonRpcResponse::success(
        request.id,
        serde_json::json!({
            "tools": handler.list_tools()
        }),
    )
}

async fn handle_tools_call(handler: &ToolHandler, request: JsonRpcRequest) -> JsonRpcResponse {
    debug!("Handling tools/call");

    let params = match request.params.as_object() {
        Some(obj) => obj,
        None => {
            return JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_params("params must be an object"),
            );
        }
    };

    let tool_name = match params.get("name").and_then(|v| v.as_str()) {
        Some(name) => name,
        None => {
            return JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_params("missing 'name' field"),
            );
        }
    };

    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or(Value::Object(serde_json::Map::new()));

    match handler.execute(tool_name, arguments).await {
        Ok(result) => JsonRpcResponse::success(
            request.id,
            serde_json::json!({
                "content": [
                    {
                        "type": "text",
                        "text": serde_json::to_string_pretty(&result).unwrap_or_else(|_| result.to_string())
                    }
                ]
            }),
        ),
        Err(e) => JsonRpcResponse::error(request.id, JsonRpcError::from(&e)),
    }
}
