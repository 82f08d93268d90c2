//! # cyberclaw Core
//!
//! Domain types, traits, and error definitions for the cyberclaw security
//! assistant. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external capability is defined as a trait here. Implementations
//! live in their respective crates. This enables:
//! - Swapping LLM vendors and tool transports via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod mode;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, ToolHostError};
pub use message::{ChatMessage, ContentBlock, MessageContent, Role};
pub use mode::AgentMode;
pub use provider::{ChatOutcome, Provider, ToolUseRequest};
pub use tool::{HostTool, ToolCallResult, ToolDescriptor, ToolHost};
