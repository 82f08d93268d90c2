//! MCP client layer for cyberclaw.
//!
//! External security tools live in separate server processes speaking the
//! Model Context Protocol over stdio. This crate owns that boundary: the
//! JSON-RPC framing, the per-server stdio transport, and the router that
//! folds every connected server's tools into one namespaced catalog.

pub mod protocol;
pub mod router;
pub mod stdio;

pub use router::ToolRouter;
pub use stdio::StdioToolHost;
