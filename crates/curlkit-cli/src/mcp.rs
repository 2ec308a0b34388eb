//! MCP (Model Context Protocol) server implementation
//!
//! Implements a JSON-RPC 2.0 server that exposes the curlkit tools.
//!
//! Protocol:
//! - Input: JSON-RPC messages on stdin, one per line
//! - Output: JSON-RPC responses on stdout, one per line
//! - Notifications (no `id`) are never answered
//!
//! Each `tools/call` runs on its own task so a slow request does not hold up
//! the others; all responses go through a single stdout writer.

use anyhow::{Context, Result};
use curlkit::{HttpExecutor, ToolOutput, Toolkit};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

const PROTOCOL_VERSION: &str = "2024-11-05";
const JSONRPC_VERSION: &str = "2.0";

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

/// Incoming JSON-RPC message. No `id` means it is a notification.
#[derive(Debug, Deserialize)]
struct Message {
    #[serde(rename = "jsonrpc")]
    _version: String,
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

/// Outgoing JSON-RPC reply
#[derive(Debug, Serialize)]
struct Reply {
    jsonrpc: &'static str,
    id: Value,
    #[serde(flatten)]
    outcome: Outcome,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum Outcome {
    Result(Value),
    Error(RpcError),
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i32,
    message: String,
}

impl Reply {
    fn ok(id: Value, result: impl Serialize) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            outcome: Outcome::Result(serde_json::to_value(result).unwrap_or_default()),
        }
    }

    fn err(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            outcome: Outcome::Error(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Entry of a `tools/list` result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListedTool {
    name: String,
    description: String,
    input_schema: Value,
}

/// Result of `tools/call`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CallResult {
    content: Vec<TextContent>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    is_error: bool,
}

#[derive(Debug, Serialize)]
struct TextContent {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

impl From<ToolOutput> for CallResult {
    fn from(output: ToolOutput) -> Self {
        Self {
            content: vec![TextContent {
                kind: "text",
                text: output.text,
            }],
            is_error: output.is_error,
        }
    }
}

/// Run the MCP server until stdin closes.
pub async fn run(executor: Arc<HttpExecutor>) -> Result<()> {
    let toolkit = Arc::new(Toolkit::new(executor));
    let (tx, mut rx) = mpsc::unbounded_channel::<Reply>();

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(response) = rx.recv().await {
            let mut line = serde_json::to_vec(&response)?;
            line.push(b'\n');
            stdout.write_all(&line).await?;
            stdout.flush().await?;
        }
        anyhow::Ok(())
    });

    tracing::info!(version = curlkit::VERSION, "mcp server ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read line from stdin")?
    {
        if line.trim().is_empty() {
            continue;
        }

        let request = match decode(&line) {
            Ok(request) => request,
            Err(response) => {
                let _ = tx.send(response);
                continue;
            }
        };

        if request.method == "tools/call" {
            let toolkit = Arc::clone(&toolkit);
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(response) = handle_request(&toolkit, request).await {
                    let _ = tx.send(response);
                }
            });
        } else if let Some(response) = handle_request(&toolkit, request).await {
            let _ = tx.send(response);
        }
    }

    // In-flight calls still hold senders; the writer drains them before exiting.
    drop(tx);
    writer.await.context("stdout writer task failed")??;
    Ok(())
}

/// Decode one line, or produce the error reply for it.
fn decode(line: &str) -> std::result::Result<Message, Reply> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| Reply::err(Value::Null, PARSE_ERROR, format!("Parse error: {e}")))?;
    let id = value.get("id").cloned().unwrap_or(Value::Null);
    serde_json::from_value(value)
        .map_err(|e| Reply::err(id, INVALID_REQUEST, format!("Invalid request: {e}")))
}

async fn handle_request(toolkit: &Toolkit, message: Message) -> Option<Reply> {
    let Some(id) = message.id else {
        tracing::debug!(method = %message.method, "notification");
        return None;
    };

    let reply = match message.method.as_str() {
        "initialize" => Reply::ok(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {"tools": {}},
                "serverInfo": {"name": "curlkit", "version": curlkit::VERSION},
            }),
        ),
        "ping" => Reply::ok(id, json!({})),
        "tools/list" => Reply::ok(id, json!({ "tools": list_tools(toolkit) })),
        "tools/call" => call_tool(toolkit, id, &message.params).await,
        "shutdown" => Reply::ok(id, Value::Null),
        _ => Reply::err(id, METHOD_NOT_FOUND, "Method not found"),
    };
    Some(reply)
}

fn list_tools(toolkit: &Toolkit) -> Vec<ListedTool> {
    toolkit
        .tools()
        .iter()
        .map(|tool| ListedTool {
            name: tool.name().to_string(),
            description: tool.description(),
            input_schema: tool.input_schema(),
        })
        .collect()
}

async fn call_tool(toolkit: &Toolkit, id: Value, params: &Value) -> Reply {
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return Reply::err(id, INVALID_PARAMS, "Missing tool name");
    };
    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

    let output = toolkit.call(name, arguments).await;
    Reply::ok(id, CallResult::from(output))
}
