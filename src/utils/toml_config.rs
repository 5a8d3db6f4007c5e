//! TOML-based configuration for MindfulSpace
//!
//! Infrastructure settings (server, backend, inference provider) and the
//! tunables of the chat and community cores live in `mindful.toml`. Every
//! section is optional; missing values fall back to the defaults below.
//! Secrets are never written inline: the file names the environment
//! variable that holds them (`api_key_env`).

use crate::backend::HostedBackendConfig;
use crate::llm::Provider;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure loaded from mindful.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MindfulConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub inference: InferenceConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub community: CommunityConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

// ============= Backend Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process store, lost on restart
    #[default]
    Memory,
    /// Hosted app backend over REST
    Hosted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    /// App root URL, required for `hosted`
    pub base_url: Option<String>,

    pub app_id: Option<String>,

    /// Environment variable containing the service API key
    pub api_key_env: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            base_url: None,
            app_id: None,
            api_key_env: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// ============= Inference Configuration =============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum InferenceConfig {
    /// The hosted backend's `InvokeLLM` integration; needs `backend.kind = "hosted"`
    Hosted,
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        #[serde(default = "default_ollama_model")]
        model: String,
    },
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2".to_string()
}

impl Default for InferenceConfig {
    fn default() -> Self {
        InferenceConfig::Ollama {
            base_url: default_ollama_url(),
            model: default_ollama_model(),
        }
    }
}

// ============= Chat Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_inference_timeout")]
    pub inference_timeout_secs: u64,

    /// Prior messages rendered into the prompt; unlimited when unset
    pub history_window: Option<usize>,

    #[serde(default = "default_crisis_hotline")]
    pub crisis_hotline: String,

    /// Added to the built-in crisis phrases
    #[serde(default)]
    pub extra_crisis_phrases: Vec<String>,

    /// Sessions untouched for this long are dropped
    #[serde(default = "default_session_idle")]
    pub session_idle_secs: u64,

    #[serde(default = "default_eviction_interval")]
    pub eviction_interval_secs: u64,
}

fn default_inference_timeout() -> u64 {
    60
}

fn default_crisis_hotline() -> String {
    "988".to_string()
}

fn default_session_idle() -> u64 {
    1800
}

fn default_eviction_interval() -> u64 {
    60
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            inference_timeout_secs: default_inference_timeout(),
            history_window: None,
            crisis_hotline: default_crisis_hotline(),
            extra_crisis_phrases: Vec::new(),
            session_idle_secs: default_session_idle(),
            eviction_interval_secs: default_eviction_interval(),
        }
    }
}

impl ChatConfig {
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    pub fn eviction_interval(&self) -> Duration {
        Duration::from_secs(self.eviction_interval_secs)
    }
}

// ============= Community Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityConfig {
    /// Version-checked attempts per reaction when the store has no atomic increment
    #[serde(default = "default_reaction_retry_limit")]
    pub reaction_retry_limit: u32,

    /// Fixed seed for anonymous names (tests and demos)
    pub name_seed: Option<u64>,
}

fn default_reaction_retry_limit() -> u32 {
    5
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            reaction_retry_limit: default_reaction_retry_limit(),
            name_seed: None,
        }
    }
}

// ============= Errors =============

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl From<ConfigError> for crate::types::AppError {
    fn from(err: ConfigError) -> Self {
        crate::types::AppError::Configuration(err.to_string())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl MindfulConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: MindfulConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency and that referenced env vars are set
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server.host cannot be empty".to_string(),
            ));
        }

        if self.backend.kind == BackendKind::Hosted {
            let base_url = self.backend.base_url.as_deref().unwrap_or_default();
            if !is_http_url(base_url) {
                return Err(ConfigError::ValidationError(format!(
                    "backend.base_url must be an http(s) URL for the hosted backend, got '{}'",
                    base_url
                )));
            }
            if self
                .backend
                .app_id
                .as_deref()
                .is_none_or(|id| id.trim().is_empty())
            {
                return Err(ConfigError::ValidationError(
                    "backend.app_id is required for the hosted backend".to_string(),
                ));
            }
            if let Some(ref env) = self.backend.api_key_env {
                self.validate_env_var(env)?;
            }
        }

        if self.backend.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "backend.request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        match &self.inference {
            InferenceConfig::Hosted => {
                if self.backend.kind != BackendKind::Hosted {
                    return Err(ConfigError::ValidationError(
                        "inference provider 'hosted' requires backend.kind = \"hosted\""
                            .to_string(),
                    ));
                }
            }
            InferenceConfig::Ollama { base_url, model } => {
                if !is_http_url(base_url) {
                    return Err(ConfigError::ValidationError(format!(
                        "inference.base_url must be an http(s) URL, got '{}'",
                        base_url
                    )));
                }
                if model.trim().is_empty() {
                    return Err(ConfigError::ValidationError(
                        "inference.model cannot be empty".to_string(),
                    ));
                }
            }
        }

        if self.chat.inference_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "chat.inference_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.chat.history_window == Some(0) {
            return Err(ConfigError::ValidationError(
                "chat.history_window must be at least 1 when set".to_string(),
            ));
        }
        if self.chat.crisis_hotline.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "chat.crisis_hotline cannot be empty".to_string(),
            ));
        }
        if self.chat.session_idle_secs == 0 || self.chat.eviction_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "chat.session_idle_secs and chat.eviction_interval_secs must be greater than zero"
                    .to_string(),
            ));
        }

        if self.community.reaction_retry_limit == 0 {
            return Err(ConfigError::ValidationError(
                "community.reaction_retry_limit must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Connection settings for the hosted backend, with the API key resolved.
    pub fn hosted_backend(&self) -> Result<HostedBackendConfig, ConfigError> {
        let base_url = self.backend.base_url.clone().ok_or_else(|| {
            ConfigError::ValidationError("backend.base_url is not set".to_string())
        })?;
        let app_id = self.backend.app_id.clone().ok_or_else(|| {
            ConfigError::ValidationError("backend.app_id is not set".to_string())
        })?;
        let api_key = match &self.backend.api_key_env {
            Some(env) => Some(
                self.resolve_env(env)
                    .ok_or_else(|| ConfigError::MissingEnvVar(env.clone()))?,
            ),
            None => None,
        };

        Ok(HostedBackendConfig {
            base_url,
            app_id,
            api_key,
            request_timeout_secs: self.backend.request_timeout_secs,
        })
    }

    /// The inference provider selected by `[inference]`.
    pub fn inference_provider(&self) -> Result<Provider, ConfigError> {
        match &self.inference {
            InferenceConfig::Hosted => Ok(Provider::Hosted(self.hosted_backend()?)),
            InferenceConfig::Ollama { base_url, model } => Ok(Provider::Ollama {
                base_url: base_url.clone(),
                model: model.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> String {
        r#"
[server]
host = "0.0.0.0"
port = 8080
log_level = "debug"
log_format = "json"

[backend]
kind = "hosted"
base_url = "https://backend.example.com/api/apps/demo"
app_id = "demo"
api_key_env = "PATH"
request_timeout_secs = 15

[inference]
provider = "hosted"

[chat]
inference_timeout_secs = 20
history_window = 12
crisis_hotline = "116 123"
extra_crisis_phrases = ["give up on everything"]

[community]
reaction_retry_limit = 3
name_seed = 7
"#
        .to_string()
    }

    #[test]
    fn test_parse_config() {
        let config = MindfulConfig::parse(&create_test_config()).expect("Failed to parse config");

        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.backend.kind, BackendKind::Hosted);
        assert_eq!(config.inference, InferenceConfig::Hosted);
        assert_eq!(config.chat.history_window, Some(12));
        assert_eq!(config.chat.inference_timeout(), Duration::from_secs(20));
        assert_eq!(config.chat.session_idle_secs, 1800);
        assert_eq!(config.community.reaction_retry_limit, 3);
        assert_eq!(config.community.name_seed, Some(7));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = MindfulConfig::parse("").unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
        assert_eq!(config.backend.kind, BackendKind::Memory);
        assert_eq!(config.chat.inference_timeout_secs, 60);
        assert_eq!(config.chat.crisis_hotline, "988");
        assert!(config.chat.history_window.is_none());
        assert_eq!(config.community.reaction_retry_limit, 5);
        assert!(matches!(config.inference, InferenceConfig::Ollama { .. }));
    }

    #[test]
    fn test_hosted_backend_requires_url() {
        let err = MindfulConfig::parse("[backend]\nkind = \"hosted\"\napp_id = \"demo\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_hosted_inference_requires_hosted_backend() {
        let err = MindfulConfig::parse("[inference]\nprovider = \"hosted\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_missing_env_var() {
        let content = r#"
[backend]
kind = "hosted"
base_url = "http://localhost:9000"
app_id = "demo"
api_key_env = "MINDFUL_TEST_KEY_THAT_IS_NEVER_SET"
"#;
        let err = MindfulConfig::parse(content).unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingEnvVar(ref name) if name == "MINDFUL_TEST_KEY_THAT_IS_NEVER_SET")
        );
    }

    #[test]
    fn test_zero_values_rejected() {
        for content in [
            "[chat]\ninference_timeout_secs = 0\n",
            "[chat]\nhistory_window = 0\n",
            "[community]\nreaction_retry_limit = 0\n",
            "[backend]\nrequest_timeout_secs = 0\n",
        ] {
            assert!(
                matches!(
                    MindfulConfig::parse(content),
                    Err(ConfigError::ValidationError(_))
                ),
                "accepted: {}",
                content
            );
        }
    }

    #[test]
    fn test_unknown_provider_is_parse_error() {
        let err = MindfulConfig::parse("[inference]\nprovider = \"gpt\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_inference_provider_resolution() {
        let config = MindfulConfig::parse(&create_test_config()).unwrap();
        match config.inference_provider().unwrap() {
            Provider::Hosted(hosted) => {
                assert_eq!(hosted.app_id, "demo");
                assert_eq!(hosted.request_timeout_secs, 15);
                assert!(hosted.api_key.is_some());
            }
            other => panic!("unexpected provider: {:?}", other),
        }

        let local = MindfulConfig::default();
        assert!(matches!(
            local.inference_provider().unwrap(),
            Provider::Ollama { .. }
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = MindfulConfig::load("/definitely/not/here/mindful.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
