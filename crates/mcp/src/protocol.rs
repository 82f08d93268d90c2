//! JSON-RPC 2.0 framing and the MCP methods the client speaks.
//!
//! The transport is newline-delimited JSON over a child process's stdio.
//! Only the client→server calls cyberclaw needs are modeled: `initialize`
//! (plus the `notifications/initialized` notification), `tools/list`, and
//! `tools/call`.

use cyberclaw_core::tool::HostTool;
use serde::{Deserialize, Serialize};

/// The MCP protocol revision this client negotiates.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// The client identity sent during the initialize handshake.
pub const CLIENT_NAME: &str = "cyberclaw";
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A JSON-RPC request frame.
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: i64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    pub fn new(id: i64, method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC notification frame (no id, no response expected).
#[derive(Debug, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params: None,
        }
    }
}

/// A JSON-RPC response frame. Frames without an `id` are server-initiated
/// notifications and are skipped by the transport.
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// The error object of a failed JSON-RPC call.
#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

/// Build the `initialize` request params.
pub fn initialize_params() -> serde_json::Value {
    serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {},
        "clientInfo": {
            "name": CLIENT_NAME,
            "version": CLIENT_VERSION,
        }
    })
}

/// Build the `tools/call` request params.
pub fn call_tool_params(name: &str, arguments: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "arguments": arguments,
    })
}

/// The result payload of `tools/list`.
#[derive(Debug, Deserialize)]
pub struct ListToolsResult {
    #[serde(default)]
    pub tools: Vec<HostTool>,
}
