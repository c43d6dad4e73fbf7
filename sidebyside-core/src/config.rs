//! Configuration system for sidebyside.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.
//! Configuration is loaded from `~/.config/sidebyside/config.toml` and/or
//! `.sidebyside/config.toml` in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Top-level configuration for the comparison service and its clients.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub client: ClientConfig,
}

/// Configuration for the chat-completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier sent with every completion request.
    pub model: String,
    /// Environment variable name containing the API key.
    pub api_key_env: String,
    /// API key set directly in config (takes precedence over `api_key_env`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Optional base URL override (defaults to the OpenAI API).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Sampling temperature; kept low so tables stay stable.
    pub temperature: f32,
    /// Request timeout. Unset inherits the HTTP client default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4.1-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            base_url: None,
            temperature: 0.2,
            timeout_secs: None,
        }
    }
}

impl LlmConfig {
    /// Validate this LLM config and return any warnings.
    ///
    /// Returns an empty Vec if the config is valid. Warnings never block startup.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.model.trim().is_empty() {
            warnings.push("model is empty; the provider will reject every request".to_string());
        }
        if self.temperature < 0.0 || self.temperature > 2.0 {
            warnings.push(format!(
                "temperature ({}) is outside the typical range 0.0–2.0",
                self.temperature
            ));
        }
        if self.timeout_secs == Some(0) {
            warnings.push("timeout_secs = 0 makes every request time out".to_string());
        }
        warnings
    }

    /// Resolve the API key from config or the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration for the terminal client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of a running comparison service.
    pub server_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8787".to_string(),
        }
    }
}

/// Load configuration with layered merging.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `SIDEBYSIDE_`)
/// 3. Workspace-local config (`.sidebyside/config.toml`)
/// 4. User config (`~/.config/sidebyside/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&ServiceConfig>,
) -> Result<ServiceConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(ServiceConfig::default()));

    if let Some(dirs) = directories::ProjectDirs::from("dev", "sidebyside", "sidebyside") {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".sidebyside").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // SIDEBYSIDE_LLM__MODEL, SIDEBYSIDE_SERVER__PORT, ...
    figment = figment.merge(Env::prefixed("SIDEBYSIDE_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })
}

/// Check whether any sidebyside configuration file exists.
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if let Some(dirs) = directories::ProjectDirs::from("dev", "sidebyside", "sidebyside")
        && dirs.config_dir().join("config.toml").exists()
    {
        return true;
    }

    workspace.is_some_and(|ws| ws.join(".sidebyside").join("config.toml").exists())
}

/// Render a config as TOML (used by `sidebyside config show`).
pub fn to_toml(config: &ServiceConfig) -> Result<String, ConfigError> {
    toml::to_string_pretty(config).map_err(|e| ConfigError::Invalid {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.llm.model, "gpt-4.1-mini");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
        assert!(config.llm.timeout_secs.is_none());
        assert_eq!(config.server.bind_addr(), "127.0.0.1:8787");
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = ServiceConfig::default();
        let toml_str = to_toml(&config).unwrap();
        let restored: ServiceConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(restored.llm.model, config.llm.model);
        assert_eq!(restored.server.port, config.server.port);
        assert_eq!(restored.client.server_url, config.client.server_url);
    }

    #[test]
    fn test_load_config_with_overrides() {
        let mut overrides = ServiceConfig::default();
        overrides.llm.model = "gpt-4o-mini".to_string();
        overrides.server.port = 9000;

        let config = load_config(None, Some(&overrides)).unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_load_config_from_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_dir = dir.path().join(".sidebyside");
        std::fs::create_dir_all(&cfg_dir).unwrap();
        std::fs::write(
            cfg_dir.join("config.toml"),
            r#"
[llm]
model = "local-model"
api_key_env = "LOCAL_KEY"
base_url = "http://localhost:11434/v1"
temperature = 0.0
timeout_secs = 30

[server]
host = "0.0.0.0"
port = 3000
"#,
        )
        .unwrap();

        let config = load_config(Some(dir.path()), None).unwrap();
        assert_eq!(config.llm.model, "local-model");
        assert_eq!(config.llm.base_url.as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(config.llm.timeout_secs, Some(30));
        assert_eq!(config.server.bind_addr(), "0.0.0.0:3000");
        assert!(config_exists(Some(dir.path())));
    }

    #[test]
    fn test_load_config_rejects_bad_types() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_dir = dir.path().join(".sidebyside");
        std::fs::create_dir_all(&cfg_dir).unwrap();
        std::fs::write(cfg_dir.join("config.toml"), "[server]\nport = \"not a port\"\n").unwrap();

        let err = load_config(Some(dir.path()), None).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_llm_config_validate_defaults_clean() {
        assert!(LlmConfig::default().validate().is_empty());
    }

    #[test]
    fn test_llm_config_validate_bad_temperature() {
        let config = LlmConfig {
            temperature: 3.0,
            ..Default::default()
        };
        let warnings = config.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("temperature"));
    }

    #[test]
    fn test_resolve_api_key_prefers_inline_key() {
        let config = LlmConfig {
            api_key: Some("sk-inline".into()),
            api_key_env: "SIDEBYSIDE_TEST_UNSET_KEY_VAR".into(),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-inline"));
    }

    #[test]
    fn test_resolve_api_key_blank_is_missing() {
        let config = LlmConfig {
            api_key: Some("   ".into()),
            api_key_env: "SIDEBYSIDE_TEST_UNSET_KEY_VAR".into(),
            ..Default::default()
        };
        assert!(config.resolve_api_key().is_none());
    }
}
