//! OpenAI-compatible provider implementation.
//!
//! Works with OpenAI, Z.AI GLM, Ollama, and any other endpoint exposing an
//! OpenAI-compatible `/chat/completions`:
//! - Bearer auth
//! - System prompt prepended as a `system` message
//! - Tool use via `tool_calls` / `tool`-role messages

use async_trait::async_trait;
use cyberclaw_core::error::ProviderError;
use cyberclaw_core::message::{ChatMessage, ContentBlock, MessageContent, Role};
use cyberclaw_core::provider::{ChatOutcome, Provider, ToolUseRequest};
use cyberclaw_core::tool::ToolDescriptor;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
            client,
        }
    }

    /// OpenAI direct (convenience constructor).
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>, max_tokens: u32) -> Self {
        let model = model_or(model.into(), "gpt-4o");
        Self::new(
            "OpenAI (ChatGPT)",
            "https://api.openai.com/v1",
            api_key,
            model,
            max_tokens,
        )
    }

    /// Z.AI GLM (convenience constructor).
    pub fn zai(api_key: impl Into<String>, model: impl Into<String>, max_tokens: u32) -> Self {
        let model = model_or(model.into(), "glm-4.6");
        Self::new(
            "ZAI (GLM)",
            "https://api.z.ai/api/paas/v4",
            api_key,
            model,
            max_tokens,
        )
    }

    /// Ollama local models — no real key required.
    pub fn ollama(base_url: Option<&str>, model: impl Into<String>, max_tokens: u32) -> Self {
        let model = model_or(model.into(), "deepseek-r1:14b");
        Self::new(
            "Ollama (local)",
            format!(
                "{}/v1",
                base_url.unwrap_or("http://localhost:11434").trim_end_matches('/')
            ),
            "ollama",
            model,
            max_tokens,
        )
    }

    /// Flatten the block-structured transcript into OpenAI's message shapes:
    /// tool-use blocks become assistant `tool_calls`, tool-result blocks
    /// become `tool`-role messages correlated by `tool_call_id`.
    fn to_api_messages(history: &[ChatMessage], system_prompt: &str) -> Vec<ApiMessage> {
        let mut result = vec![ApiMessage {
            role: "system".into(),
            content: Some(system_prompt.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }];

        for msg in history {
            match &msg.content {
                MessageContent::Text(text) => result.push(ApiMessage {
                    role: role_str(msg.role).into(),
                    content: Some(text.clone()),
                    tool_calls: None,
                    tool_call_id: None,
                }),
                MessageContent::Blocks(blocks) => {
                    for block in blocks {
                        match block {
                            ContentBlock::Text { text } => result.push(ApiMessage {
                                role: role_str(msg.role).into(),
                                content: Some(text.clone()),
                                tool_calls: None,
                                tool_call_id: None,
                            }),
                            ContentBlock::ToolUse { id, name, input } => result.push(ApiMessage {
                                role: "assistant".into(),
                                content: None,
                                tool_calls: Some(vec![ApiToolCall {
                                    id: id.clone(),
                                    r#type: "function".into(),
                                    function: ApiFunction {
                                        name: name.clone(),
                                        arguments: input.to_string(),
                                    },
                                }]),
                                tool_call_id: None,
                            }),
                            ContentBlock::ToolResult {
                                tool_use_id,
                                content,
                                is_error,
                            } => result.push(ApiMessage {
                                role: "tool".into(),
                                content: Some(if *is_error {
                                    format!("Error: {content}")
                                } else {
                                    content.clone()
                                }),
                                tool_calls: None,
                                tool_call_id: Some(tool_use_id.clone()),
                            }),
                        }
                    }
                }
            }
        }

        result
    }

    /// Convert catalog descriptors to OpenAI function-tool definitions.
    fn to_api_tools(tools: &[ToolDescriptor]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.input_schema.clone(),
                },
            })
            .collect()
    }

    /// First tool call wins; otherwise the message content is the answer.
    fn choice_to_outcome(choice: ApiChoice) -> Result<ChatOutcome, ProviderError> {
        if let Some(tool_calls) = choice.message.tool_calls {
            if let Some(tc) = tool_calls.into_iter().next() {
                let input: serde_json::Value = serde_json::from_str(&tc.function.arguments)
                    .map_err(|e| {
                        ProviderError::MalformedResponse(format!(
                            "unparseable tool arguments for '{}': {e}",
                            tc.function.name
                        ))
                    })?;
                return Ok(ChatOutcome::ToolUse(ToolUseRequest {
                    id: tc.id,
                    name: tc.function.name,
                    input,
                }));
            }
        }

        Ok(ChatOutcome::Text(choice.message.content.unwrap_or_default()))
    }
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn model_or(model: String, default: &str) -> String {
    if model.is_empty() {
        default.to_string()
    } else {
        model
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(
        &self,
        history: &[ChatMessage],
        system_prompt: &str,
        tools: &[ToolDescriptor],
    ) -> Result<ChatOutcome, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": Self::to_api_messages(history, system_prompt),
            "max_tokens": self.max_tokens,
        });

        if !tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(tools));
        }

        debug!(provider = %self.name, model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
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
                "Invalid API key or insufficient permissions".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(provider = %self.name, status, body = %error_body, "Provider returned error");
            if status == 402
                || error_body.contains("insufficient_quota")
                || error_body.contains("billing")
            {
                return Err(ProviderError::InsufficientCredit(error_body));
            }
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let choice = api_response.choices.into_iter().next().ok_or_else(|| {
            ProviderError::MalformedResponse("No choices in response".into())
        })?;

        Self::choice_to_outcome(choice)
    }
}

// --- OpenAI-compatible API types ---

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ApiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ApiToolCall>>,
}
