//! The agentic tool-use control loop.
//!
//! An `AgentSession` owns the conversation transcript and drives the
//! turn-by-turn exchange with the provider: each turn the provider sees the
//! full transcript and the aggregated tool catalog, and answers with either
//! final text (the loop ends) or a tool-use request (the router dispatches
//! it, the result is folded back in, and the loop continues).
//!
//! Tool failures never abort the loop — they are folded back into the
//! transcript as error-flagged results so the model can recover. Only
//! provider failures surface from `chat`, classified for user messaging.

use std::sync::Arc;

use cyberclaw_core::error::{Error, ProviderError};
use cyberclaw_core::message::ChatMessage;
use cyberclaw_core::mode::AgentMode;
use cyberclaw_core::provider::{ChatOutcome, Provider};
use cyberclaw_mcp::ToolRouter;
use cyberclaw_providers::classify::{classify, suggestion};
use tracing::{error, info, warn};

use crate::prompts;

/// Hard cap on tool rounds within one `chat` call — the safety valve
/// against runaway tool-calling. Not configurable per call.
const MAX_TOOL_ITERATIONS: u32 = 10;

/// The fixed text returned when the iteration budget runs out. A degraded
/// but normal termination, not an error.
const ITERATION_LIMIT_MESSAGE: &str =
    "Maximum tool execution iterations reached without a final answer.";

/// One conversational session: a provider binding, a set of connected tool
/// hosts, and the transcript accumulated across `chat` calls.
///
/// The transcript is never truncated automatically; it is the durable
/// context for subsequent calls, and `clear_history` is the only way to
/// empty it.
pub struct AgentSession {
    provider: Arc<dyn Provider>,
    router: ToolRouter,
    mode: AgentMode,
    system_prompt: String,
    history: Vec<ChatMessage>,
    model: String,
}

impl AgentSession {
    /// Create a session over an already-constructed provider and an
    /// already-connected router. Connecting the router first (and awaiting
    /// it) is deliberate: early calls may still see a partial catalog when
    /// some servers failed to come up, and that is an accepted steady
    /// state.
    pub fn new(
        provider: Arc<dyn Provider>,
        router: ToolRouter,
        mode: AgentMode,
        model: impl Into<String>,
    ) -> Self {
        info!(provider = provider.name(), %mode, "Agent session initialized");
        Self {
            provider,
            router,
            mode,
            system_prompt: prompts::system_prompt(mode),
            history: Vec::new(),
            model: model.into(),
        }
    }

    /// Send a user message and drive the agentic loop to a final answer.
    ///
    /// Appends to the transcript: the user message, each assistant turn,
    /// and each tool-result turn. Fails only on provider failures, wrapped
    /// with the provider name and — where the failure classifies as
    /// credit/auth/rate-limit — a remediation suggestion.
    pub async fn chat(&mut self, user_message: &str) -> Result<String, Error> {
        match self.run_turn(user_message).await {
            Ok(text) => Ok(text),
            Err(err) => {
                let provider = self.provider.name().to_string();
                error!(provider = %provider, error = %err, "Provider error in chat");
                let reason = match classify(&err) {
                    Some(kind) => format!("{err}\n\n{}", suggestion(kind, &provider)),
                    None => err.to_string(),
                };
                Err(Error::Communication { provider, reason })
            }
        }
    }

    /// The bounded loop. Tool-execution failures are absorbed here; only
    /// provider failures propagate.
    async fn run_turn(&mut self, user_message: &str) -> Result<String, ProviderError> {
        self.history.push(ChatMessage::user(user_message));

        info!(
            provider = self.provider.name(),
            mode = %self.mode,
            "Sending message to provider"
        );

        // Fresh catalog snapshot per chat call — hosts may have degraded or
        // recovered since the last one.
        let tools = self.router.list_tools().await;

        let mut iterations = 0;
        while iterations < MAX_TOOL_ITERATIONS {
            let outcome = self
                .provider
                .chat(&self.history, &self.system_prompt, &tools)
                .await?;

            match outcome {
                ChatOutcome::Text(text) => {
                    self.history.push(ChatMessage::assistant(&text));
                    info!(provider = self.provider.name(), "Received final response");
                    return Ok(text);
                }
                ChatOutcome::ToolUse(request) => {
                    info!(tool = %request.name, id = %request.id, "Agent requested tool execution");
                    self.history.push(ChatMessage::tool_use(
                        &request.id,
                        &request.name,
                        request.input.clone(),
                    ));

                    match self.router.call_tool(&request.name, request.input).await {
                        Ok(result) => {
                            let payload = serde_json::to_string(&result).unwrap_or_default();
                            self.history
                                .push(ChatMessage::tool_result(&request.id, payload, false));
                        }
                        Err(e) => {
                            warn!(tool = %request.name, error = %e, "Tool execution failed");
                            self.history.push(ChatMessage::tool_result(
                                &request.id,
                                format!("Error: {e}"),
                                true,
                            ));
                        }
                    }

                    iterations += 1;
                }
            }
        }

        Ok(ITERATION_LIMIT_MESSAGE.to_string())
    }

    /// Run a security analysis task: the task text plus optional structured
    /// context, through the normal chat path.
    pub async fn analyze(
        &mut self,
        task: &str,
        context: Option<&serde_json::Value>,
    ) -> Result<String, Error> {
        let prompt = match context {
            Some(ctx) => format!(
                "{task}\n\nContext:\n{}",
                serde_json::to_string_pretty(ctx).unwrap_or_default()
            ),
            None => task.to_string(),
        };
        self.chat(&prompt).await
    }

    /// Switch the operating mode. Replaces the system prompt used by the
    /// next provider call; the transcript is untouched.
    pub fn set_mode(&mut self, mode: AgentMode) {
        self.mode = mode;
        self.system_prompt = prompts::system_prompt(mode);
        info!(%mode, "Agent mode changed");
    }

    /// Empty the transcript. Mode and provider binding are untouched.
    pub fn clear_history(&mut self) {
        self.history.clear();
        info!("Conversation history cleared");
    }

    pub fn mode(&self) -> AgentMode {
        self.mode
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// The aggregated catalog, as the next provider call would see it.
    pub async fn available_tools(&self) -> Vec<cyberclaw_core::tool::ToolDescriptor> {
        self.router.list_tools().await
    }

    /// Release all tool host connections.
    pub async fn shutdown(&self) {
        self.router.disconnect_all().await;
    }
}
