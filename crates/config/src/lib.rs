//! Configuration loading, validation, and management for cyberclaw.
//!
//! Loads configuration from `~/.cyberclaw/config.toml` with environment
//! variable overrides. Environment is read only here, at load time — core
//! logic receives explicit settings structs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.cyberclaw/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Which provider backs the session
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier; empty means the provider's default
    #[serde(default)]
    pub model: String,

    /// Maximum tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Provider-specific configurations, keyed by provider tag
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// External tool servers to connect at session start
    #[serde(default = "default_tool_servers")]
    pub tool_servers: Vec<ToolServerConfig>,
}

fn default_provider() -> String {
    "anthropic".into()
}
fn default_max_tokens() -> u32 {
    4096
}

/// Per-provider credentials and endpoint overrides.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// One external tool server, launched as a subprocess speaking MCP stdio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolServerConfig {
    /// Unique name — also the namespace prefix for this server's tools
    pub name: String,

    #[serde(default)]
    pub enabled: bool,

    /// Executable to spawn
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment for the child process
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// The seeded server list mirrors the tools the assistant is built around.
/// All disabled until the operator turns them on.
fn default_tool_servers() -> Vec<ToolServerConfig> {
    vec![
        ToolServerConfig {
            name: "nuclei".into(),
            enabled: false,
            command: "npx".into(),
            args: vec!["-y".into(), "@cyproxio/mcp-nuclei".into()],
            env: HashMap::new(),
        },
        ToolServerConfig {
            name: "ffuf".into(),
            enabled: false,
            command: "npx".into(),
            args: vec!["-y".into(), "@cyproxio/mcp-ffuf".into()],
            env: HashMap::new(),
        },
        ToolServerConfig {
            name: "gobuster".into(),
            enabled: false,
            command: "npx".into(),
            args: vec!["-y".into(), "@cyproxio/mcp-gobuster".into()],
            env: HashMap::new(),
        },
        ToolServerConfig {
            name: "dirbuster".into(),
            enabled: false,
            command: "npx".into(),
            args: vec!["-y".into(), "@cyproxio/mcp-dirbuster".into()],
            env: HashMap::new(),
        },
    ]
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("providers", &self.providers)
            .field("tool_servers", &self.tool_servers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.cyberclaw/config.toml).
    ///
    /// Environment overrides, applied after the file:
    /// - `CYBERCLAW_PROVIDER`, `CYBERCLAW_MODEL`
    /// - `ANTHROPIC_API_KEY`, `OPENAI_API_KEY`, `GOOGLE_API_KEY`,
    ///   `ZAI_API_KEY` — fill the matching provider's key if unset
    /// - `OLLAMA_BASE_URL` — fills the ollama base URL if unset
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(provider) = std::env::var("CYBERCLAW_PROVIDER") {
            config.provider = provider;
        }
        if let Ok(model) = std::env::var("CYBERCLAW_MODEL") {
            config.model = model;
        }

        for (tag, var) in [
            ("anthropic", "ANTHROPIC_API_KEY"),
            ("openai", "OPENAI_API_KEY"),
            ("gemini", "GOOGLE_API_KEY"),
            ("zai", "ZAI_API_KEY"),
        ] {
            if let Ok(key) = std::env::var(var) {
                let entry = config.providers.entry(tag.into()).or_default();
                if entry.api_key.is_none() {
                    entry.api_key = Some(key);
                }
            }
        }

        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            let entry = config.providers.entry("ollama".into()).or_default();
            if entry.base_url.is_none() {
                entry.base_url = Some(url);
            }
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".cyberclaw")
    }

    /// The config table for a provider tag, if present.
    pub fn provider_config(&self, tag: &str) -> Option<&ProviderConfig> {
        self.providers.get(tag)
    }

    /// Only the tool servers that should actually be launched.
    pub fn enabled_tool_servers(&self) -> Vec<&ToolServerConfig> {
        self.tool_servers.iter().filter(|s| s.enabled).collect()
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "max_tokens must be greater than 0".into(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for server in &self.tool_servers {
            if !seen.insert(server.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate tool server name '{}'",
                    server.name
                )));
            }
            if server.command.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "tool server '{}' has an empty command",
                    server.name
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string (for first-run setup).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: String::new(),
            max_tokens: default_max_tokens(),
            providers: HashMap::new(),
            tool_servers: default_tool_servers(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for cyberclaw_core::Error {
    fn from(err: ConfigError) -> Self {
        cyberclaw_core::Error::Config {
            message: err.to_string(),
        }
    }
}
