//! Anthropic native provider implementation.
//!
//! Uses Anthropic's Messages API directly:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Native tool use with `tool_use` / `tool_result` content blocks
//!
//! The transcript's block structure maps 1:1 onto the Messages API, so
//! conversion here is mostly mechanical.

use async_trait::async_trait;
use cyberclaw_core::error::ProviderError;
use cyberclaw_core::message::{ChatMessage, ContentBlock, MessageContent, Role};
use cyberclaw_core::provider::{ChatOutcome, Provider, ToolUseRequest};
use cyberclaw_core::tool::ToolDescriptor;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider bound to a model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, max_tokens: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .unwrap_or_default();

        let model = model.into();
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: if model.is_empty() {
                DEFAULT_MODEL.into()
            } else {
                model
            },
            max_tokens,
            client,
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Convert transcript entries to Anthropic API format.
    fn to_api_messages(history: &[ChatMessage]) -> Vec<ApiMessage> {
        history
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                let content = match &msg.content {
                    MessageContent::Text(text) => ApiContent::Text(text.clone()),
                    MessageContent::Blocks(blocks) => {
                        ApiContent::Blocks(blocks.iter().map(ApiBlock::from).collect())
                    }
                };
                ApiMessage {
                    role: role.into(),
                    content,
                }
            })
            .collect()
    }

    /// Convert catalog descriptors to Anthropic tool definitions.
    fn to_api_tools(tools: &[ToolDescriptor]) -> Vec<ApiTool> {
        tools
            .iter()
            .map(|t| ApiTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema.clone(),
            })
            .collect()
    }

    /// Pick the outcome out of a response: the first `tool_use` block wins;
    /// otherwise all text blocks are joined into the final answer.
    fn response_to_outcome(resp: ApiResponse) -> Result<ChatOutcome, ProviderError> {
        for block in &resp.content {
            if let ResponseBlock::ToolUse { id, name, input } = block {
                return Ok(ChatOutcome::ToolUse(ToolUseRequest {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }));
            }
        }

        let text = resp
            .content
            .iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ChatOutcome::Text(text))
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "Claude (Anthropic)"
    }

    async fn chat(
        &self,
        history: &[ChatMessage],
        system_prompt: &str,
        tools: &[ToolDescriptor],
    ) -> Result<ChatOutcome, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);

        let mut body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": system_prompt,
            "messages": Self::to_api_messages(history),
        });

        if !tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(tools));
        }

        debug!(model = %self.model, messages = history.len(), "Sending Anthropic request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited { retry_after_secs: 5 });
        }
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid Anthropic API key".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Anthropic API error");
            if status == 402 || error_body.contains("credit balance") {
                return Err(ProviderError::InsufficientCredit(error_body));
            }
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        Self::response_to_outcome(api_resp)
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: ApiContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ApiContent {
    Text(String),
    Blocks(Vec<ApiBlock>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiBlock {
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
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

impl From<&ContentBlock> for ApiBlock {
    fn from(block: &ContentBlock) -> Self {
        match block {
            ContentBlock::Text { text } => ApiBlock::Text { text: text.clone() },
            ContentBlock::ToolUse { id, name, input } => ApiBlock::ToolUse {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            },
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => ApiBlock::ToolResult {
                tool_use_id: tool_use_id.clone(),
                content: content.clone(),
                is_error: *is_error,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_defaults() {
        let provider = AnthropicProvider::new("sk-ant-test", "", 4096);
        assert_eq!(provider.name(), "Claude (Anthropic)");
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(provider.model, DEFAULT_MODEL);
    }

    #[test]
    fn constructor_with_base_url() {
        let provider = AnthropicProvider::new("sk-ant-test", "claude-sonnet-4-5", 4096)
            .with_base_url("https://custom.proxy.com/");
        assert_eq!(provider.base_url, "https://custom.proxy.com");
    }

    #[test]
    fn message_conversion_text() {
        let history = vec![ChatMessage::user("Hello"), ChatMessage::assistant("Hi!")];
        let api = AnthropicProvider::to_api_messages(&history);
        assert_eq!(api.len(), 2);
        assert_eq!(api[0].role, "user");
        assert_eq!(api[1].role, "assistant");
        let json = serde_json::to_value(&api[0]).unwrap();
        assert_eq!(json["content"], "Hello");
    }

    #[test]
    fn message_conversion_tool_blocks() {
        let history = vec![
            ChatMessage::tool_use("toolu_1", "nuclei_scan", serde_json::json!({"target": "x"})),
            ChatMessage::tool_result("toolu_1", "results", false),
        ];
        let api = AnthropicProvider::to_api_messages(&history);
        let tool_use = serde_json::to_value(&api[0]).unwrap();
        assert_eq!(tool_use["content"][0]["type"], "tool_use");
        assert_eq!(tool_use["content"][0]["id"], "toolu_1");

        let tool_result = serde_json::to_value(&api[1]).unwrap();
        assert_eq!(tool_result["role"], "user");
        assert_eq!(tool_result["content"][0]["type"], "tool_result");
        assert_eq!(tool_result["content"][0]["tool_use_id"], "toolu_1");
        // is_error is omitted when false
        assert!(tool_result["content"][0].get("is_error").is_none());
    }

    #[test]
    fn error_flag_serialized_when_set() {
        let history = vec![ChatMessage::tool_result("toolu_2", "Error: boom", true)];
        let api = AnthropicProvider::to_api_messages(&history);
        let json = serde_json::to_value(&api[0]).unwrap();
        assert_eq!(json["content"][0]["is_error"], true);
    }

    #[test]
    fn tool_definition_conversion() {
        let tools = vec![ToolDescriptor {
            name: "nuclei_scan".into(),
            original_name: "scan".into(),
            server_name: "nuclei".into(),
            description: "Run a template scan".into(),
            input_schema: serde_json::json!({"type": "object"}),
        }];
        let api_tools = AnthropicProvider::to_api_tools(&tools);
        assert_eq!(api_tools.len(), 1);
        assert_eq!(api_tools[0].name, "nuclei_scan");
        assert_eq!(api_tools[0].input_schema["type"], "object");
    }

    #[test]
    fn parse_text_response() {
        let resp: ApiResponse =
            serde_json::from_str(r#"{"content": [{"type": "text", "text": "No findings."}]}"#)
                .unwrap();
        match AnthropicProvider::response_to_outcome(resp).unwrap() {
            ChatOutcome::Text(text) => assert_eq!(text, "No findings."),
            _ => panic!("Expected text outcome"),
        }
    }

    #[test]
    fn parse_tool_use_response() {
        let resp: ApiResponse = serde_json::from_str(
            r#"{"content": [
                {"type": "text", "text": "Scanning now."},
                {"type": "tool_use", "id": "toolu_abc", "name": "nuclei_scan",
                 "input": {"target": "example.com"}}
            ]}"#,
        )
        .unwrap();
        match AnthropicProvider::response_to_outcome(resp).unwrap() {
            ChatOutcome::ToolUse(req) => {
                assert_eq!(req.id, "toolu_abc");
                assert_eq!(req.name, "nuclei_scan");
                assert_eq!(req.input["target"], "example.com");
            }
            _ => panic!("Expected tool use outcome"),
        }
    }

    #[test]
    fn multiple_text_blocks_joined() {
        let resp: ApiResponse = serde_json::from_str(
            r#"{"content": [
                {"type": "text", "text": "Part one."},
                {"type": "text", "text": "Part two."}
            ]}"#,
        )
        .unwrap();
        match AnthropicProvider::response_to_outcome(resp).unwrap() {
            ChatOutcome::Text(text) => assert_eq!(text, "Part one.\nPart two."),
            _ => panic!("Expected text outcome"),
        }
    }
}
