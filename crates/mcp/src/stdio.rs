//! MCP tool host over a child process's stdio.
//!
//! Spawns the configured server command with piped stdin/stdout, performs
//! the initialize handshake, then serves strictly sequential JSON-RPC
//! request/response exchanges. The agent loop never has two tool calls in
//! flight, so one transport lock is all the coordination needed.

use async_trait::async_trait;
use cyberclaw_config::ToolServerConfig;
use cyberclaw_core::error::ToolHostError;
use cyberclaw_core::tool::{HostTool, ToolCallResult, ToolHost};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::protocol::{
    call_tool_params, initialize_params, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult,
};

/// One connected MCP server, reached over its stdio.
#[derive(Debug)]
pub struct StdioToolHost {
    name: String,
    transport: Mutex<Transport>,
}

#[derive(Debug)]
struct Transport {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    next_id: i64,
}

impl StdioToolHost {
    /// Spawn the server process and complete the MCP handshake.
    pub async fn connect(config: &ToolServerConfig) -> Result<Self, ToolHostError> {
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolHostError::Transport {
                host: config.name.clone(),
                reason: format!("failed to spawn '{}': {e}", config.command),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| ToolHostError::Transport {
            host: config.name.clone(),
            reason: "child stdin unavailable".into(),
        })?;
        let stdout = child
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| ToolHostError::Transport {
                host: config.name.clone(),
                reason: "child stdout unavailable".into(),
            })?;

        let host = Self {
            name: config.name.clone(),
            transport: Mutex::new(Transport {
                child,
                stdin,
                stdout,
                next_id: 0,
            }),
        };

        host.request("initialize", Some(initialize_params())).await?;
        host.notify("notifications/initialized").await?;

        info!(host = %host.name, command = %config.command, "Connected to MCP server");
        Ok(host)
    }

    /// Send one request and read frames until its response arrives.
    /// Notifications and stray ids are skipped, not buffered.
    async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, ToolHostError> {
        let mut transport = self.transport.lock().await;
        transport.next_id += 1;
        let id = transport.next_id;

        let frame = serde_json::to_string(&JsonRpcRequest::new(id, method, params))
            .map_err(|e| self.transport_error(e.to_string()))?;

        debug!(host = %self.name, method, id, "MCP request");

        transport
            .stdin
            .write_all(format!("{frame}\n").as_bytes())
            .await
            .map_err(|e| self.transport_error(e.to_string()))?;
        transport
            .stdin
            .flush()
            .await
            .map_err(|e| self.transport_error(e.to_string()))?;

        let mut line = String::new();
        loop {
            line.clear();
            let read = transport
                .stdout
                .read_line(&mut line)
                .await
                .map_err(|e| self.transport_error(e.to_string()))?;
            if read == 0 {
                return Err(self.transport_error("server closed its stdout".into()));
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let response: JsonRpcResponse = match serde_json::from_str(trimmed) {
                Ok(r) => r,
                Err(e) => {
                    warn!(host = %self.name, error = %e, "Skipping unparseable MCP frame");
                    continue;
                }
            };

            match response.id {
                Some(rid) if rid == id => {
                    if let Some(err) = response.error {
                        return Err(ToolHostError::Protocol {
                            host: self.name.clone(),
                            code: err.code,
                            message: err.message,
                        });
                    }
                    return Ok(response.result.unwrap_or(serde_json::Value::Null));
                }
                Some(rid) => {
                    warn!(host = %self.name, expected = id, got = rid, "Skipping stale MCP response");
                }
                // Server-initiated notification; nothing to correlate.
                None => {}
            }
        }
    }

    /// Send a notification — fire and forget.
    async fn notify(&self, method: &str) -> Result<(), ToolHostError> {
        let mut transport = self.transport.lock().await;
        let frame = serde_json::to_string(&JsonRpcNotification::new(method))
            .map_err(|e| self.transport_error(e.to_string()))?;
        transport
            .stdin
            .write_all(format!("{frame}\n").as_bytes())
            .await
            .map_err(|e| self.transport_error(e.to_string()))?;
        transport
            .stdin
            .flush()
            .await
            .map_err(|e| self.transport_error(e.to_string()))
    }

    fn transport_error(&self, reason: String) -> ToolHostError {
        ToolHostError::Transport {
            host: self.name.clone(),
            reason,
        }
    }
}

#[async_trait]
impl ToolHost for StdioToolHost {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> Result<Vec<HostTool>, ToolHostError> {
        let result = self.request("tools/list", None).await?;
        let parsed: ListToolsResult =
            serde_json::from_value(result).map_err(|e| self.transport_error(format!(
                "malformed tools/list result: {e}"
            )))?;
        Ok(parsed.tools)
    }

    async fn call_tool(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> Result<ToolCallResult, ToolHostError> {
        let result = self
            .request("tools/call", Some(call_tool_params(name, args)))
            .await?;
        serde_json::from_value(result).map_err(|e| {
            self.transport_error(format!("malformed tools/call result: {e}"))
        })
    }

    async fn close(&self) -> Result<(), ToolHostError> {
        let mut transport = self.transport.lock().await;
        transport
            .child
            .kill()
            .await
            .map_err(|e| self.transport_error(format!("failed to stop server: {e}")))
    }
}
