//! Conversation transcript domain types.
//!
//! These are the core value objects that flow through the system:
//! the user sends a message → the agent loop appends it to the transcript →
//! the provider reads the whole transcript each turn and answers with text
//! or a tool-use request → tool results are folded back in as user entries.
//!
//! The transcript is append-only within a chat turn. Insertion order is
//! conversational order and is exactly what the provider sees.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user (also carries tool results back to the provider)
    User,
    /// The AI assistant
    Assistant,
}

/// A single entry in the conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message ID
    pub id: String,

    /// Who this entry belongs to
    pub role: Role,

    /// Plain text or a sequence of content blocks
    pub content: MessageContent,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

/// Entry content: plain text, or structured blocks for tool traffic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// One block inside a structured entry.
///
/// A `ToolResult` block must always be preceded earlier in the transcript by
/// the `ToolUse` block whose `id` it answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

impl ChatMessage {
    /// Create a plain-text user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            content: MessageContent::Text(content.into()),
            timestamp: Utc::now(),
        }
    }

    /// Create a plain-text assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: MessageContent::Text(content.into()),
            timestamp: Utc::now(),
        }
    }

    /// Create an assistant message carrying a single tool-use request.
    pub fn tool_use(
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: MessageContent::Blocks(vec![ContentBlock::ToolUse {
                id: id.into(),
                name: name.into(),
                input,
            }]),
            timestamp: Utc::now(),
        }
    }

    /// Create a user message carrying a single tool result, correlated back
    /// to the tool-use request by `tool_use_id`.
    pub fn tool_result(
        tool_use_id: impl Into<String>,
        content: impl Into<String>,
        is_error: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            content: MessageContent::Blocks(vec![ContentBlock::ToolResult {
                tool_use_id: tool_use_id.into(),
                content: content.into(),
                is_error,
            }]),
            timestamp: Utc::now(),
        }
    }

    /// The message text if this is a plain-text entry.
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(t) => Some(t),
            MessageContent::Blocks(_) => None,
        }
    }

    /// The tool-use request carried by this entry, if any.
    pub fn tool_use_block(&self) -> Option<(&str, &str, &serde_json::Value)> {
        match &self.content {
            MessageContent::Blocks(blocks) => blocks.iter().find_map(|b| match b {
                ContentBlock::ToolUse { id, name, input } => {
                    Some((id.as_str(), name.as_str(), input))
                }
                _ => None,
            }),
            MessageContent::Text(_) => None,
        }
    }

    /// The tool result carried by this entry, if any.
    pub fn tool_result_block(&self) -> Option<(&str, &str, bool)> {
        match &self.content {
            MessageContent::Blocks(blocks) => blocks.iter().find_map(|b| match b {
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => Some((tool_use_id.as_str(), content.as_str(), *is_error)),
                _ => None,
            }),
            MessageContent::Text(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = ChatMessage::user("Scan example.com");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.as_text(), Some("Scan example.com"));
    }

    #[test]
    fn tool_use_message_carries_request() {
        let msg = ChatMessage::tool_use(
            "call_123",
            "nuclei_scan",
            serde_json::json!({"target": "example.com"}),
        );
        assert_eq!(msg.role, Role::Assistant);
        let (id, name, input) = msg.tool_use_block().unwrap();
        assert_eq!(id, "call_123");
        assert_eq!(name, "nuclei_scan");
        assert_eq!(input["target"], "example.com");
        assert!(msg.as_text().is_none());
    }

    #[test]
    fn tool_result_correlates_by_id() {
        let msg = ChatMessage::tool_result("call_123", "CVE-2024-1234", false);
        assert_eq!(msg.role, Role::User);
        let (id, content, is_error) = msg.tool_result_block().unwrap();
        assert_eq!(id, "call_123");
        assert_eq!(content, "CVE-2024-1234");
        assert!(!is_error);
    }

    #[test]
    fn error_flagged_tool_result() {
        let msg = ChatMessage::tool_result("call_9", "Error: host unreachable", true);
        let (_, _, is_error) = msg.tool_result_block().unwrap();
        assert!(is_error);
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = ChatMessage::tool_use("toolu_1", "ffuf_fuzz", serde_json::json!({"url": "x"}));
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"tool_use\""));
        let back: ChatMessage = serde_json::from_str(&json).unwrap();
        let (id, name, _) = back.tool_use_block().unwrap();
        assert_eq!(id, "toolu_1");
        assert_eq!(name, "ffuf_fuzz");
    }

    #[test]
    fn is_error_defaults_to_false_on_deserialize() {
        let json = r#"{"type":"tool_result","tool_use_id":"c1","content":"ok"}"#;
        let block: ContentBlock = serde_json::from_str(json).unwrap();
        match block {
            ContentBlock::ToolResult { is_error, .. } => assert!(!is_error),
            _ => panic!("Expected tool_result block"),
        }
    }
}
