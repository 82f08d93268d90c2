//! LLM Provider implementations for cyberclaw.
//!
//! All providers implement the `cyberclaw_core::Provider` trait.
//! The factory selects the correct backend from configuration; failure
//! classification turns provider errors into actionable user messages.

pub mod anthropic;
pub mod classify;
pub mod factory;
pub mod gemini;
pub mod openai_compat;

pub use anthropic::AnthropicProvider;
pub use classify::{classify, suggestion, FailureKind};
pub use factory::{build_from_config, build_provider, ProviderKind, ProviderSettings};
pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatProvider;
