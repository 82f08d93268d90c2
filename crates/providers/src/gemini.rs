//! Google Gemini provider implementation.
//!
//! Uses the `generateContent` REST endpoint:
//! - API key as a query parameter
//! - System prompt via `system_instruction`
//! - Tools via `function_declarations`
//! - Assistant turns map to the `model` role
//!
//! Gemini has no native tool-result message shape compatible with our
//! transcript, so block-structured entries are JSON-flattened into text
//! parts. Function calls carry no correlation id, so one is synthesized.

use async_trait::async_trait;
use cyberclaw_core::error::ProviderError;
use cyberclaw_core::message::{ChatMessage, MessageContent, Role};
use cyberclaw_core::provider::{ChatOutcome, Provider, ToolUseRequest};
use cyberclaw_core::tool::ToolDescriptor;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Google Gemini provider.
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider bound to a model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
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
            client,
        }
    }

    /// Create with a custom base URL (for testing).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Convert transcript entries to Gemini `contents`. Block entries are
    /// flattened to their JSON text, mirroring the upstream client.
    fn to_api_contents(history: &[ChatMessage]) -> Vec<ApiContent> {
        history
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                let text = match &msg.content {
                    MessageContent::Text(text) => text.clone(),
                    MessageContent::Blocks(blocks) => {
                        serde_json::to_string(blocks).unwrap_or_default()
                    }
                };
                ApiContent {
                    role: role.into(),
                    parts: vec![ApiPart { text }],
                }
            })
            .collect()
    }

    /// Convert catalog descriptors to Gemini function declarations.
    fn to_function_declarations(tools: &[ToolDescriptor]) -> Vec<FunctionDeclaration> {
        tools
            .iter()
            .map(|t| FunctionDeclaration {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.input_schema.clone(),
            })
            .collect()
    }

    /// First function call wins; Gemini supplies no call id, so synthesize
    /// one unique within the chat invocation.
    fn response_to_outcome(resp: ApiResponse) -> Result<ChatOutcome, ProviderError> {
        let candidate = resp.candidates.into_iter().next().ok_or_else(|| {
            ProviderError::MalformedResponse("No candidates in Gemini response".into())
        })?;

        let mut text_parts = Vec::new();
        for part in candidate.content.parts {
            if let Some(call) = part.function_call {
                return Ok(ChatOutcome::ToolUse(ToolUseRequest {
                    id: format!("gemini_call_{}", Uuid::new_v4().simple()),
                    name: call.name,
                    input: call.args,
                }));
            }
            if let Some(text) = part.text {
                text_parts.push(text);
            }
        }

        Ok(ChatOutcome::Text(text_parts.join("\n")))
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "Gemini (Google)"
    }

    async fn chat(
        &self,
        history: &[ChatMessage],
        system_prompt: &str,
        tools: &[ToolDescriptor],
    ) -> Result<ChatOutcome, ProviderError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let mut body = serde_json::json!({
            "system_instruction": { "parts": [{ "text": system_prompt }] },
            "contents": Self::to_api_contents(history),
        });

        if !tools.is_empty() {
            body["tools"] = serde_json::json!([{
                "function_declarations": Self::to_function_declarations(tools)
            }]);
        }

        debug!(model = %self.model, messages = history.len(), "Sending Gemini request");

        let response = self
            .client
            .post(&url)
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
                "Invalid Google API key".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini API error");
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

// --- Gemini API types ---

#[derive(Debug, Serialize)]
struct ApiContent {
    role: String,
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize)]
struct ApiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(rename = "functionCall", default)]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}
