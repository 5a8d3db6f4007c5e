//! Init command implementation
//!
//! Writes a starter `mindful.toml` and `.env.example` for either backend.

use super::InitBackend;
use super::output::{Mark, Output};
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug)]
pub enum InitResult {
    Success,
    /// mindful.toml already exists and `--force` was not given
    AlreadyExists,
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    pub path: PathBuf,
    pub force: bool,
    pub backend: InitBackend,
    pub host: String,
    pub port: u16,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.section("Initializing MindfulSpace");

    let base_path = &config.path;
    if !base_path.exists() {
        if let Err(e) = fs::create_dir_all(base_path) {
            output.status(
                Mark::Problem,
                &format!("Failed to create {}: {}", base_path.display(), e),
            );
            return InitResult::Error(e.to_string());
        }
    }

    let config_path = base_path.join("mindful.toml");
    if config_path.exists() && !config.force {
        output.status(
            Mark::Caution,
            &format!(
                "{} already exists; pass --force to overwrite it",
                config_path.display()
            ),
        );
        return InitResult::AlreadyExists;
    }

    if let Err(e) = write_file(&config_path, &generate_mindful_toml(&config), true) {
        output.status(Mark::Problem, &format!("Failed to write mindful.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.wrote(&config_path);

    let env_path = base_path.join(".env.example");
    if env_path.exists() && !config.force {
        output.kept(&env_path, "already exists");
    } else if let Err(e) = write_file(&env_path, &generate_env_example(config.backend), true) {
        output.status(Mark::Problem, &format!("Failed to write .env.example: {}", e));
        return InitResult::Error(e.to_string());
    } else {
        output.wrote(&env_path);
    }

    output.status(Mark::Ok, "Project initialized");
    output.section("Next steps");
    let first_step = match config.backend {
        InitBackend::Hosted => {
            output.next_step(
                1,
                "Copy .env.example to .env and fill in MINDFUL_BACKEND_API_KEY",
                Some("cp .env.example .env"),
            );
            output.next_step(
                2,
                "Set backend.base_url and backend.app_id in mindful.toml",
                None,
            );
            3
        }
        InitBackend::Memory => {
            output.next_step(
                1,
                "Start Ollama and pull the model named in [inference]",
                Some("ollama pull llama3.2"),
            );
            2
        }
    };
    output.next_step(first_step, "Start the server", Some("mindful-server"));

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

fn generate_mindful_toml(config: &InitConfig) -> String {
    let backend_section = match config.backend {
        InitBackend::Memory => {
            r#"# In-process store; posts and comments are lost on restart
[backend]
kind = "memory"

# Local inference through Ollama
[inference]
provider = "ollama"
base_url = "http://localhost:11434"
model = "llama3.2"
"#
        }
        InitBackend::Hosted => {
            r#"# Hosted app backend (entities, identity, InvokeLLM)
[backend]
kind = "hosted"
base_url = "https://backend.example.com/api/apps/your-app-id"
app_id = "your-app-id"
api_key_env = "MINDFUL_BACKEND_API_KEY"
request_timeout_secs = 30

[inference]
provider = "hosted"
"#
        }
    };

    format!(
        r#"# MindfulSpace configuration

[server]
host = "{host}"
port = {port}
log_level = "info"
# "pretty" or "json"
log_format = "pretty"

{backend_section}
[chat]
inference_timeout_secs = 60
# Prior messages included in each prompt; omit for the whole conversation
# history_window = 20
crisis_hotline = "988"
extra_crisis_phrases = []
session_idle_secs = 1800
eviction_interval_secs = 60

[community]
# Attempts per reaction when the store has no atomic increment
reaction_retry_limit = 5
"#,
        host = config.host,
        port = config.port,
        backend_section = backend_section,
    )
}

fn generate_env_example(backend: InitBackend) -> String {
    let mut content = String::from("# Logging override (takes precedence over server.log_level)\n# RUST_LOG=mindful=debug,tower_http=info\n");
    if backend == InitBackend::Hosted {
        content.push_str("\n# Service key for the hosted backend\nMINDFUL_BACKEND_API_KEY=\n");
    }
    content
}
