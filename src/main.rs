//! MindfulSpace server entry point.

use anyhow::{Context, Result};
use mindful::{
    AppState, MindfulConfig,
    api::routes,
    cli::{
        Cli, Commands,
        init::{self, InitConfig, InitResult},
        output::{Mark, Output},
    },
    utils::toml_config::{InferenceConfig, LogFormat},
};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    let output = Output::for_flags(cli.no_color);

    match cli.command {
        Some(Commands::Init {
            path,
            force,
            backend,
            host,
            port,
        }) => {
            let result = init::run(
                InitConfig {
                    path,
                    force,
                    backend,
                    host,
                    port,
                },
                &output,
            );
            match result {
                InitResult::Success | InitResult::AlreadyExists => Ok(()),
                InitResult::Error(e) => anyhow::bail!(e),
            }
        }
        Some(Commands::Config { validate }) => show_config(&cli.config, validate, &output),
        Some(Commands::Serve) | None => serve(&cli.config, cli.verbose).await,
    }
}

fn show_config(path: &Path, validate: bool, output: &Output) -> Result<()> {
    let config = match MindfulConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            output.status(Mark::Problem, &e.to_string());
            output.status(
                Mark::Note,
                "Run `mindful-server init` to create a configuration",
            );
            anyhow::bail!(e);
        }
    };

    if validate {
        // Hosted settings are only resolved at startup, so check them here too.
        if let Err(e) = config.inference_provider() {
            output.status(Mark::Problem, &e.to_string());
            anyhow::bail!(e);
        }
        output.status(Mark::Ok, &format!("{} is valid", path.display()));
        return Ok(());
    }

    output.section("Configuration");
    output.setting("file", &path.display().to_string());
    output.setting("listen", &config.bind_addr());
    output.setting("backend", &format!("{:?}", config.backend.kind).to_lowercase());
    let inference = match &config.inference {
        InferenceConfig::Hosted => "hosted InvokeLLM".to_string(),
        InferenceConfig::Ollama { base_url, model } => format!("ollama {} at {}", model, base_url),
    };
    output.setting("inference", &inference);
    output.setting(
        "inference timeout",
        &format!("{}s", config.chat.inference_timeout_secs),
    );
    output.setting(
        "history window",
        &config
            .chat
            .history_window
            .map(|n| n.to_string())
            .unwrap_or_else(|| "all".to_string()),
    );
    output.setting("crisis hotline", &config.chat.crisis_hotline);
    output.setting(
        "reaction retries",
        &config.community.reaction_retry_limit.to_string(),
    );
    Ok(())
}

fn init_tracing(config: &MindfulConfig, verbose: bool) {
    let default_level = if verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("mindful={},tower_http={}", default_level, default_level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.server.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn serve(config_path: &Path, verbose: bool) -> Result<()> {
    let config = MindfulConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    init_tracing(&config, verbose);

    info!("Starting MindfulSpace v{}", env!("CARGO_PKG_VERSION"));

    let idle = config.chat.session_idle();
    let interval = config.chat.eviction_interval();
    let addr = config.bind_addr();

    let state = AppState::from_config(config)
        .await
        .context("building application state")?;
    info!(model = %state.chat.model_name(), "inference ready");

    let shutdown = CancellationToken::new();
    let eviction = state
        .sessions
        .clone()
        .spawn_eviction(idle, interval, shutdown.clone());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "listening");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, routes::app(state))
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            server_shutdown.cancel();
        })
        .await
        .context("server error")?;

    shutdown.cancel();
    let _ = eviction.await;
    info!("MindfulSpace shutdown complete");
    Ok(())
}
