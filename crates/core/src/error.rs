//! Error types for the cyberclaw domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all cyberclaw operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool host errors ---
    #[error("Tool host error: {0}")]
    ToolHost(#[from] ToolHostError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A provider failure surfaced from `AgentSession::chat`, already
    /// classified and annotated with a remediation suggestion where one
    /// applies. This is the only fault shape `chat` produces.
    #[error("{provider} communication failed: {reason}")]
    Communication { provider: String, reason: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Insufficient credit: {0}")]
    InsufficientCredit(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ToolHostError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool host not connected: {0}")]
    HostUnavailable(String),

    #[error("Transport error on host {host}: {reason}")]
    Transport { host: String, reason: String },

    #[error("Tool call failed on host {host}: {message} (code {code})")]
    Protocol { host: String, code: i64, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn tool_host_error_displays_correctly() {
        let err = Error::ToolHost(ToolHostError::Transport {
            host: "nuclei".into(),
            reason: "broken pipe".into(),
        });
        assert!(err.to_string().contains("nuclei"));
        assert!(err.to_string().contains("broken pipe"));
    }

    #[test]
    fn communication_error_names_provider() {
        let err = Error::Communication {
            provider: "Claude (Anthropic)".into(),
            reason: "rate limited".into(),
        };
        assert!(err.to_string().contains("Claude (Anthropic)"));
    }
}
