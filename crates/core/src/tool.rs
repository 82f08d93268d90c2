//! ToolHost trait and tool catalog types.
//!
//! A ToolHost is an external process exposing a discoverable, callable set
//! of tools (a scanner, a fuzzer, a brute-forcer). The router aggregates
//! every connected host's tools into one namespace-qualified catalog.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolHostError;

/// A tool as reported by a single host, before namespacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostTool {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// JSON Schema for the tool's arguments. Passed through opaquely to the
    /// provider; never interpreted here.
    #[serde(rename = "inputSchema", default)]
    pub input_schema: serde_json::Value,
}

/// One entry in the aggregated tool catalog presented to the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Namespaced name, unique across the whole catalog: `{host}_{tool}`
    pub name: String,

    /// The tool's name as the owning host knows it
    pub original_name: String,

    /// Which host owns this tool
    pub server_name: String,

    pub description: String,

    /// Opaque JSON Schema passthrough
    pub input_schema: serde_json::Value,
}

impl ToolDescriptor {
    /// Qualify a host-local tool into the aggregate namespace.
    pub fn namespaced(server_name: &str, tool: HostTool) -> Self {
        Self {
            name: format!("{}_{}", server_name, tool.name),
            original_name: tool.name,
            server_name: server_name.to_string(),
            description: tool.description,
            input_schema: tool.input_schema,
        }
    }
}

/// The result of a tool invocation, as returned by the owning host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// Opaque result payload (MCP content array)
    #[serde(default)]
    pub content: serde_json::Value,

    /// Whether the host itself flagged the call as failed
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

/// The core ToolHost trait.
///
/// One instance per connected tool server. The connection is a scoped
/// resource: acquired at startup, released by `close()`. A host that drops
/// mid-session degrades out of the catalog rather than crashing anything.
#[async_trait]
pub trait ToolHost: Send + Sync {
    /// The host's configured name — also the namespace prefix for its tools.
    fn name(&self) -> &str;

    /// Discover the tools this host currently exports.
    async fn list_tools(&self) -> std::result::Result<Vec<HostTool>, ToolHostError>;

    /// Execute a tool by its host-local name.
    async fn call_tool(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> std::result::Result<ToolCallResult, ToolHostError>;

    /// Release the connection. Must be safe to call once at shutdown.
    async fn close(&self) -> std::result::Result<(), ToolHostError>;
}
