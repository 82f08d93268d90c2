//! Provider trait — the abstraction over LLM backends.
//!
//! A Provider knows how to send the conversation transcript to an LLM and
//! return either the model's final text or a single tool-use request.
//!
//! Implementations: Anthropic native, OpenAI-compatible (OpenAI, Z.AI GLM,
//! Ollama), Google Gemini.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::ChatMessage;
use crate::tool::ToolDescriptor;

/// A tool-use request produced by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolUseRequest {
    /// Correlation id — provider-supplied, or synthesized by the provider
    /// implementation when the vendor API does not supply one. Unique within
    /// a chat invocation.
    pub id: String,

    /// Namespaced tool name as presented in the catalog
    pub name: String,

    /// Opaque structured arguments
    pub input: serde_json::Value,
}

/// What a provider call produced: the final answer, or a request to run a
/// tool first.
#[derive(Debug, Clone)]
pub enum ChatOutcome {
    /// Final natural-language answer — ends the agentic loop.
    Text(String),
    /// The model wants a tool executed before it can answer.
    ToolUse(ToolUseRequest),
}

/// The core Provider trait.
///
/// Every LLM backend implements this trait. The agent loop calls `chat()`
/// without knowing which vendor is behind it. The model identifier is bound
/// at construction time by the provider factory.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A stable, human-readable name (e.g., "Claude (Anthropic)").
    /// Used only for diagnostics and error messages.
    fn name(&self) -> &str;

    /// Send the full transcript plus system prompt and tool catalog,
    /// and get back text or a tool-use request.
    async fn chat(
        &self,
        history: &[ChatMessage],
        system_prompt: &str,
        tools: &[ToolDescriptor],
    ) -> std::result::Result<ChatOutcome, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_use_request_serialization() {
        let req = ToolUseRequest {
            id: "call_123".into(),
            name: "nuclei_scan".into(),
            input: serde_json::json!({"target": "example.com"}),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("nuclei_scan"));
        let back: ToolUseRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "call_123");
        assert_eq!(back.input["target"], "example.com");
    }

    #[test]
    fn outcome_variants() {
        let text = ChatOutcome::Text("done".into());
        assert!(matches!(text, ChatOutcome::Text(_)));

        let tool = ChatOutcome::ToolUse(ToolUseRequest {
            id: "c1".into(),
            name: "ffuf_fuzz".into(),
            input: serde_json::Value::Null,
        });
        assert!(matches!(tool, ChatOutcome::ToolUse(_)));
    }
}
