//! Tool namespace router.
//!
//! Presents one flat, collision-free tool catalog to the provider while
//! routing invocations back to the owning host. Tool names are qualified as
//! `{host}_{tool}`, so two hosts exporting identically named tools never
//! collide in the aggregate.
//!
//! A partial catalog is an accepted steady state: hosts that fail to
//! connect at startup or fail a listing mid-session simply contribute
//! nothing until they recover.

use std::sync::Arc;

use cyberclaw_config::ToolServerConfig;
use cyberclaw_core::error::ToolHostError;
use cyberclaw_core::tool::{ToolCallResult, ToolDescriptor, ToolHost};
use tracing::{debug, warn};

use crate::stdio::StdioToolHost;

/// Routes namespaced tool invocations to the correct connected host.
pub struct ToolRouter {
    hosts: Vec<Arc<dyn ToolHost>>,
}

impl ToolRouter {
    /// An empty router — no hosts, empty catalog.
    pub fn new() -> Self {
        Self { hosts: Vec::new() }
    }

    /// Build a router over already-connected hosts. Connection order is
    /// preserved; it determines catalog order and probe order.
    pub fn from_hosts(hosts: Vec<Arc<dyn ToolHost>>) -> Self {
        Self { hosts }
    }

    /// Connect every enabled server, host by host. A server that fails to
    /// connect is logged and skipped — startup never aborts, and the other
    /// hosts stay available. The returned router may therefore expose a
    /// partial catalog.
    pub async fn connect_all(configs: &[&ToolServerConfig]) -> Self {
        let mut hosts: Vec<Arc<dyn ToolHost>> = Vec::new();

        for config in configs {
            match StdioToolHost::connect(config).await {
                Ok(host) => hosts.push(Arc::new(host)),
                Err(e) => {
                    warn!(host = %config.name, error = %e, "Failed to connect to MCP server, skipping");
                }
            }
        }

        Self { hosts }
    }

    /// The names of all connected hosts, in connection order.
    pub fn host_names(&self) -> Vec<&str> {
        self.hosts.iter().map(|h| h.name()).collect()
    }

    fn host(&self, name: &str) -> Option<&Arc<dyn ToolHost>> {
        self.hosts.iter().find(|h| h.name() == name)
    }

    /// Aggregate every connected host's tools into one namespaced catalog.
    ///
    /// A host that fails its listing is logged and omitted — the aggregate
    /// is never an error. Order is preserved per host, hosts in connection
    /// order.
    pub async fn list_tools(&self) -> Vec<ToolDescriptor> {
        let mut catalog = Vec::new();

        for host in &self.hosts {
            match host.list_tools().await {
                Ok(tools) => {
                    catalog.extend(
                        tools
                            .into_iter()
                            .map(|t| ToolDescriptor::namespaced(host.name(), t)),
                    );
                }
                Err(e) => {
                    warn!(host = %host.name(), error = %e, "Failed to list tools, omitting host from catalog");
                }
            }
        }

        catalog
    }

    /// Route a namespaced invocation to the owning host.
    ///
    /// The prefix before the FIRST underscore selects the host; the
    /// remainder — embedded underscores intact — is the host-local tool
    /// name. A name with no underscore falls back to probing every host in
    /// order, accepting the first that does not fault. The probe is a
    /// best-effort legacy path: which host wins for an ambiguous name is an
    /// artifact of connection order.
    ///
    /// Never retries; a single failed attempt is surfaced to the caller.
    pub async fn call_tool(
        &self,
        name: &str,
        args: serde_json::Value,
    ) -> Result<ToolCallResult, ToolHostError> {
        match name.split_once('_') {
            Some((server_name, tool_name)) => {
                let host = self
                    .host(server_name)
                    .ok_or_else(|| ToolHostError::HostUnavailable(server_name.to_string()))?;
                debug!(host = server_name, tool = tool_name, "Dispatching tool call");
                host.call_tool(tool_name, args).await
            }
            None => {
                for host in &self.hosts {
                    match host.call_tool(name, args.clone()).await {
                        Ok(result) => return Ok(result),
                        Err(e) => {
                            debug!(host = %host.name(), tool = name, error = %e, "Probe miss");
                        }
                    }
                }
                Err(ToolHostError::ToolNotFound(format!(
                    "Tool '{name}' not found in any connected MCP server"
                )))
            }
        }
    }

    /// Close every host connection. Individual close failures are logged
    /// and do not stop the remaining closes.
    pub async fn disconnect_all(&self) {
        for host in &self.hosts {
            if let Err(e) = host.close().await {
                warn!(host = %host.name(), error = %e, "Error closing MCP server");
            }
        }
    }
}

impl Default for ToolRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cyberclaw_core::tool::HostTool;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// A scripted in-memory host for router tests.
    struct MockHost {
        name: String,
        tools: Vec<HostTool>,
        fail_listing: bool,
        owns: Vec<String>,
        calls: Mutex<Vec<(String, serde_json::Value)>>,
        closed: AtomicUsize,
    }

    impl MockHost {
        fn new(name: &str, tool_names: &[&str]) -> Self {
            Self {
                name: name.into(),
                tools: tool_names
                    .iter()
                    .map(|n| HostTool {
                        name: (*n).into(),
                        description: format!("{n} tool"),
                        input_schema: serde_json::json!({"type": "object"}),
                    })
                    .collect(),
                fail_listing: false,
                owns: tool_names.iter().map(|n| (*n).to_string()).collect(),
                calls: Mutex::new(Vec::new()),
                closed: AtomicUsize::new(0),
            }
        }

        fn failing(name: &str) -> Self {
            let mut host = Self::new(name, &[]);
            host.fail_listing = true;
            host
        }
    }

    #[async_trait]
    impl ToolHost for MockHost {
        fn name(&self) -> &str {
            &self.name
        }

        async fn list_tools(&self) -> Result<Vec<HostTool>, ToolHostError> {
            if self.fail_listing {
                return Err(ToolHostError::Transport {
                    host: self.name.clone(),
                    reason: "listing failed".into(),
                });
            }
            Ok(self.tools.clone())
        }

        async fn call_tool(
            &self,
            name: &str,
            args: serde_json::Value,
        ) -> Result<ToolCallResult, ToolHostError> {
            self.calls.lock().await.push((name.to_string(), args));
            if !self.owns.iter().any(|t| t == name) {
                return Err(ToolHostError::ToolNotFound(name.to_string()));
            }
            Ok(ToolCallResult {
                content: serde_json::json!([{"type": "text", "text": format!("{}:{name}", self.name)}]),
                is_error: false,
            })
        }

        async fn close(&self) -> Result<(), ToolHostError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            if self.fail_listing {
                return Err(ToolHostError::Transport {
                    host: self.name.clone(),
                    reason: "close failed".into(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn catalog_namespaces_and_preserves_order() {
        let router = ToolRouter::from_hosts(vec![
            Arc::new(MockHost::new("nuclei", &["scan", "scan_http"])),
            Arc::new(MockHost::new("ffuf", &["fuzz"])),
        ]);

        let catalog = router.list_tools().await;
        let names: Vec<&str> = catalog.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["nuclei_scan", "nuclei_scan_http", "ffuf_fuzz"]);
        assert_eq!(catalog[0].server_name, "nuclei");
        assert_eq!(catalog[0].original_name, "scan");
    }

    #[tokio::test]
    async fn namespacing_round_trip() {
        let nuclei = Arc::new(MockHost::new("nuclei", &["scan"]));
        let router = ToolRouter::from_hosts(vec![nuclei.clone()]);

        let catalog = router.list_tools().await;
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name, "nuclei_scan");

        let result = router
            .call_tool("nuclei_scan", serde_json::json!({"target": "example.com"}))
            .await
            .unwrap();
        assert!(!result.is_error);

        let calls = nuclei.calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "scan");
        assert_eq!(calls[0].1["target"], "example.com");
    }

    #[tokio::test]
    async fn embedded_underscores_stay_with_the_tool() {
        let nuclei = Arc::new(MockHost::new("nuclei", &["scan_http"]));
        let router = ToolRouter::from_hosts(vec![nuclei.clone()]);

        router
            .call_tool("nuclei_scan_http", serde_json::json!({}))
            .await
            .unwrap();

        let calls = nuclei.calls.lock().await;
        assert_eq!(calls[0].0, "scan_http");
    }

    #[tokio::test]
    async fn partial_catalog_on_host_failure() {
        let router = ToolRouter::from_hosts(vec![
            Arc::new(MockHost::failing("nuclei")),
            Arc::new(MockHost::new("ffuf", &["fuzz"])),
        ]);

        let catalog = router.list_tools().await;
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name, "ffuf_fuzz");
    }

    #[tokio::test]
    async fn unknown_host_prefix_is_unavailable() {
        let router = ToolRouter::from_hosts(vec![Arc::new(MockHost::new("nuclei", &["scan"]))]);
        let err = router
            .call_tool("gobuster_dir", serde_json::json!({}))
            .await
            .unwrap_err();
        match err {
            ToolHostError::HostUnavailable(host) => assert_eq!(host, "gobuster"),
            other => panic!("Expected HostUnavailable, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unnamespaced_name_probes_hosts_in_order() {
        let nuclei = Arc::new(MockHost::new("nuclei", &["scan"]));
        let ffuf = Arc::new(MockHost::new("ffuf", &["fuzz"]));
        let router = ToolRouter::from_hosts(vec![nuclei.clone(), ffuf.clone()]);

        let result = router.call_tool("fuzz", serde_json::json!({})).await.unwrap();
        assert_eq!(result.content[0]["text"], "ffuf:fuzz");

        // The first host was probed and faulted before the second won.
        assert_eq!(nuclei.calls.lock().await.len(), 1);
        assert_eq!(ffuf.calls.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn probe_exhaustion_is_tool_not_found() {
        let router = ToolRouter::from_hosts(vec![
            Arc::new(MockHost::new("nuclei", &["scan"])),
            Arc::new(MockHost::new("ffuf", &["fuzz"])),
        ]);
        let err = router
            .call_tool("nmap", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolHostError::ToolNotFound(_)));
    }

    #[tokio::test]
    async fn empty_router_has_empty_catalog() {
        let router = ToolRouter::new();
        assert!(router.list_tools().await.is_empty());
        assert!(router.host_names().is_empty());
    }

    #[tokio::test]
    async fn disconnect_all_tolerates_close_failures() {
        let bad = Arc::new(MockHost::failing("bad"));
        let good = Arc::new(MockHost::new("good", &["t"]));
        let router = ToolRouter::from_hosts(vec![bad.clone(), good.clone()]);

        router.disconnect_all().await;

        // The failing close did not stop the remaining closes.
        assert_eq!(bad.closed.load(Ordering::SeqCst), 1);
        assert_eq!(good.closed.load(Ordering::SeqCst), 1);
    }
}
