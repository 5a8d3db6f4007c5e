use mindful::utils::toml_config::{BackendKind, ConfigError, InferenceConfig, LogFormat, MindfulConfig};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("mindful.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[server]
port = 4100
log_format = "json"

[chat]
history_window = 10
extra_crisis_phrases = ["give up on everything"]
"#,
    );

    let config = MindfulConfig::load(&path).unwrap();
    assert_eq!(config.bind_addr(), "127.0.0.1:4100");
    assert_eq!(config.server.log_format, LogFormat::Json);
    assert_eq!(config.backend.kind, BackendKind::Memory);
    assert_eq!(config.chat.history_window, Some(10));
    assert_eq!(config.chat.inference_timeout(), Duration::from_secs(60));
    assert_eq!(config.chat.crisis_hotline, "988");
    assert_eq!(config.community.reaction_retry_limit, 5);
    assert!(matches!(config.inference, InferenceConfig::Ollama { .. }));
}

#[test]
fn test_invalid_file_reports_validation_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[chat]
crisis_hotline = "  "
"#,
    );

    assert!(matches!(
        MindfulConfig::load(&path),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[server\nport = ");
    assert!(matches!(
        MindfulConfig::load(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[cfg(feature = "ollama")]
#[tokio::test]
async fn test_memory_backend_state_from_config() {
    use mindful::auth::AuthProvider;

    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[inference]
provider = "ollama"
model = "llama3.2"

[community]
name_seed = 9
"#,
    );

    let config = MindfulConfig::load(&path).unwrap();
    let state = mindful::AppState::from_config(config).await.unwrap();
    assert_eq!(state.chat.model_name(), "llama3.2");
    assert!(state.sessions.is_empty());
    assert!(!state.auth.is_authenticated("anything").await);
}
