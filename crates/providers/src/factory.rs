//! Provider factory — the single place mapping a provider tag to a
//! constructed backend.
//!
//! All vendor selection lives here. Settings are passed in explicitly; the
//! factory never reads the environment. A missing required API key is a
//! configuration error raised at construction — the session is never
//! created half-usable.

use std::sync::Arc;

use cyberclaw_config::AppConfig;
use cyberclaw_core::provider::Provider;
use cyberclaw_core::Error;
use tracing::info;

use crate::anthropic::AnthropicProvider;
use crate::gemini::GeminiProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// The provider families cyberclaw can sit on top of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
    Gemini,
    Ollama,
    Zai,
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "ollama" => Ok(ProviderKind::Ollama),
            "zai" | "glm" => Ok(ProviderKind::Zai),
            other => Err(format!(
                "Unknown provider '{other}'. Valid providers: anthropic, openai, gemini, ollama, zai"
            )),
        }
    }
}

impl ProviderKind {
    /// The config-table tag for this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Zai => "zai",
        }
    }
}

/// Explicit settings for one provider construction.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub max_tokens: u32,
}

impl ProviderSettings {
    /// Pull the settings for `kind` out of the app config, applying the
    /// top-level model/max_tokens defaults.
    pub fn from_config(kind: ProviderKind, config: &AppConfig) -> Self {
        let table = config.provider_config(kind.tag());
        let model = if !config.model.is_empty() {
            config.model.clone()
        } else {
            table.and_then(|t| t.model.clone()).unwrap_or_default()
        };
        Self {
            api_key: table.and_then(|t| t.api_key.clone()),
            base_url: table.and_then(|t| t.base_url.clone()),
            model,
            max_tokens: config.max_tokens,
        }
    }

    fn require_key(&self, kind: ProviderKind, env_hint: &str) -> Result<String, Error> {
        self.api_key.clone().ok_or_else(|| Error::Config {
            message: format!(
                "{} API key required for provider '{}'. Set {} or add it to the config file.",
                kind.tag(),
                kind.tag(),
                env_hint
            ),
        })
    }
}

/// Build a provider from its kind and explicit settings.
pub fn build_provider(
    kind: ProviderKind,
    settings: ProviderSettings,
) -> Result<Arc<dyn Provider>, Error> {
    let provider: Arc<dyn Provider> = match kind {
        ProviderKind::Anthropic => {
            let key = settings.require_key(kind, "ANTHROPIC_API_KEY")?;
            let mut p = AnthropicProvider::new(key, &settings.model, settings.max_tokens);
            if let Some(url) = &settings.base_url {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        ProviderKind::OpenAi => {
            let key = settings.require_key(kind, "OPENAI_API_KEY")?;
            Arc::new(OpenAiCompatProvider::openai(
                key,
                &settings.model,
                settings.max_tokens,
            ))
        }
        ProviderKind::Gemini => {
            let key = settings.require_key(kind, "GOOGLE_API_KEY")?;
            let mut p = GeminiProvider::new(key, &settings.model);
            if let Some(url) = &settings.base_url {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        ProviderKind::Ollama => Arc::new(OpenAiCompatProvider::ollama(
            settings.base_url.as_deref(),
            &settings.model,
            settings.max_tokens,
        )),
        ProviderKind::Zai => {
            let key = settings.require_key(kind, "ZAI_API_KEY")?;
            Arc::new(OpenAiCompatProvider::zai(
                key,
                &settings.model,
                settings.max_tokens,
            ))
        }
    };

    info!(provider = provider.name(), "Provider initialized");
    Ok(provider)
}

/// Build the configured provider straight from the app config.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, Error> {
    let kind: ProviderKind = config.provider.parse().map_err(|e: String| Error::Config {
        message: e,
    })?;
    build_provider(kind, ProviderSettings::from_config(kind, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyberclaw_config::ProviderConfig;

    fn settings_with_key(model: &str) -> ProviderSettings {
        ProviderSettings {
            api_key: Some("test-key".into()),
            base_url: None,
            model: model.into(),
            max_tokens: 4096,
        }
    }

    #[test]
    fn parse_provider_tags() {
        assert_eq!(
            "anthropic".parse::<ProviderKind>().unwrap(),
            ProviderKind::Anthropic
        );
        assert_eq!("claude".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert_eq!("GLM".parse::<ProviderKind>().unwrap(), ProviderKind::Zai);
        assert!("bedrock".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn anthropic_requires_key() {
        let err = build_provider(ProviderKind::Anthropic, ProviderSettings::default())
            .err()
            .expect("missing key must fail construction");
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn ollama_needs_no_key() {
        let provider =
            build_provider(ProviderKind::Ollama, ProviderSettings::default()).unwrap();
        assert_eq!(provider.name(), "Ollama (local)");
    }

    #[test]
    fn builds_each_keyed_provider() {
        for (kind, expected) in [
            (ProviderKind::Anthropic, "Claude (Anthropic)"),
            (ProviderKind::OpenAi, "OpenAI (ChatGPT)"),
            (ProviderKind::Gemini, "Gemini (Google)"),
            (ProviderKind::Zai, "ZAI (GLM)"),
        ] {
            let provider = build_provider(kind, settings_with_key("")).unwrap();
            assert_eq!(provider.name(), expected);
        }
    }

    #[test]
    fn settings_from_config_prefers_top_level_model() {
        let mut config = AppConfig::default();
        config.model = "claude-opus-4-1".into();
        config.providers.insert(
            "anthropic".into(),
            ProviderConfig {
                api_key: Some("k".into()),
                base_url: None,
                model: Some("claude-sonnet-4-5".into()),
            },
        );
        let settings = ProviderSettings::from_config(ProviderKind::Anthropic, &config);
        assert_eq!(settings.model, "claude-opus-4-1");
        assert_eq!(settings.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn settings_fall_back_to_provider_table_model() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "gemini".into(),
            ProviderConfig {
                api_key: Some("k".into()),
                base_url: None,
                model: Some("gemini-2.5-pro".into()),
            },
        );
        let settings = ProviderSettings::from_config(ProviderKind::Gemini, &config);
        assert_eq!(settings.model, "gemini-2.5-pro");
    }

    #[test]
    fn build_from_config_unknown_provider_fails() {
        let config = AppConfig {
            provider: "bedrock".into(),
            ..AppConfig::default()
        };
        assert!(build_from_config(&config).is_err());
    }
}
