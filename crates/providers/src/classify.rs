//! Provider-failure classification for user messaging.
//!
//! When a chat turn dies on a provider failure, the session maps it to one
//! of three recoverable categories and embeds a category-specific
//! remediation suggestion in the surfaced error. Anything else is reported
//! generically. Tool-execution failures never pass through here.

use cyberclaw_core::error::ProviderError;

/// The recoverable failure categories we give tailored guidance for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InsufficientCredit,
    Authentication,
    RateLimit,
}

/// Classify a provider failure, or `None` if it deserves only the generic
/// wrapping.
pub fn classify(err: &ProviderError) -> Option<FailureKind> {
    match err {
        ProviderError::InsufficientCredit(_) => Some(FailureKind::InsufficientCredit),
        ProviderError::AuthenticationFailed(_) => Some(FailureKind::Authentication),
        ProviderError::RateLimited { .. } => Some(FailureKind::RateLimit),
        ProviderError::ApiError {
            status_code,
            message,
        } => {
            let lower = message.to_ascii_lowercase();
            if *status_code == 402
                || lower.contains("credit")
                || lower.contains("billing")
                || lower.contains("insufficient_quota")
            {
                Some(FailureKind::InsufficientCredit)
            } else if *status_code == 401 || *status_code == 403 {
                Some(FailureKind::Authentication)
            } else if *status_code == 429 {
                Some(FailureKind::RateLimit)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// A remediation suggestion for a classified failure, tailored to the
/// provider the session is bound to.
pub fn suggestion(kind: FailureKind, provider_name: &str) -> String {
    let console = billing_console(provider_name);
    match kind {
        FailureKind::InsufficientCredit => format!(
            "Your account is out of credits. Top up at {console}, or switch to a different provider with --provider."
        ),
        FailureKind::Authentication => format!(
            "The API key was rejected. Check the key configured for {provider_name} (config file or environment) and that it has not expired."
        ),
        FailureKind::RateLimit => format!(
            "{provider_name} is rate limiting this key. Wait a moment and retry, or switch to a key with more headroom."
        ),
    }
}

/// Where to fix billing for each provider family.
fn billing_console(provider_name: &str) -> &'static str {
    if provider_name.contains("Anthropic") {
        "https://console.anthropic.com/settings/billing"
    } else if provider_name.contains("OpenAI") {
        "https://platform.openai.com/settings/organization/billing"
    } else if provider_name.contains("Google") {
        "https://aistudio.google.com/app/plan_information"
    } else if provider_name.contains("GLM") {
        "https://z.ai/manage-apikey/billing"
    } else {
        "your provider's billing console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_variants_classify_directly() {
        assert_eq!(
            classify(&ProviderError::RateLimited { retry_after_secs: 5 }),
            Some(FailureKind::RateLimit)
        );
        assert_eq!(
            classify(&ProviderError::AuthenticationFailed("bad key".into())),
            Some(FailureKind::Authentication)
        );
        assert_eq!(
            classify(&ProviderError::InsufficientCredit("empty".into())),
            Some(FailureKind::InsufficientCredit)
        );
    }

    #[test]
    fn api_error_status_classification() {
        let err = ProviderError::ApiError {
            status_code: 402,
            message: "payment required".into(),
        };
        assert_eq!(classify(&err), Some(FailureKind::InsufficientCredit));

        let err = ProviderError::ApiError {
            status_code: 401,
            message: "unauthorized".into(),
        };
        assert_eq!(classify(&err), Some(FailureKind::Authentication));

        let err = ProviderError::ApiError {
            status_code: 429,
            message: "slow down".into(),
        };
        assert_eq!(classify(&err), Some(FailureKind::RateLimit));
    }

    #[test]
    fn credit_detected_from_message_body() {
        let err = ProviderError::ApiError {
            status_code: 400,
            message: "Your credit balance is too low".into(),
        };
        assert_eq!(classify(&err), Some(FailureKind::InsufficientCredit));
    }

    #[test]
    fn generic_errors_are_unclassified() {
        assert_eq!(classify(&ProviderError::Network("timeout".into())), None);
        let err = ProviderError::ApiError {
            status_code: 500,
            message: "internal".into(),
        };
        assert_eq!(classify(&err), None);
    }

    #[test]
    fn suggestions_name_the_provider() {
        let s = suggestion(FailureKind::Authentication, "Claude (Anthropic)");
        assert!(s.contains("Claude (Anthropic)"));

        let s = suggestion(FailureKind::InsufficientCredit, "Claude (Anthropic)");
        assert!(s.contains("console.anthropic.com"));

        let s = suggestion(FailureKind::InsufficientCredit, "OpenAI (ChatGPT)");
        assert!(s.contains("platform.openai.com"));

        let s = suggestion(FailureKind::InsufficientCredit, "Ollama (local)");
        assert!(s.contains("billing console"));
    }
}
