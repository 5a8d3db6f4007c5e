//! CLI module for MindfulSpace
//!
//! Provides command-line interface parsing and handling for the mindful-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// MindfulSpace - mental-wellness companion server
///
/// Serves the companion chat, the anonymous community forum and the experts
/// directory over a JSON API.
#[derive(Parser, Debug)]
#[command(
    name = "mindful-server",
    version,
    about = "MindfulSpace - mental-wellness companion server",
    long_about = "Serves the companion chat (with crisis-phrase detection), the anonymous\n\
                  community forum and the experts directory over a JSON API.\n\n\
                  Run without arguments to start the server, or use 'init' to scaffold a config.",
    after_help = "EXAMPLES:\n    \
                  mindful-server init                   # Write mindful.toml and .env.example\n    \
                  mindful-server init --backend hosted  # Scaffold for the hosted backend\n    \
                  mindful-server                        # Start the server (reads mindful.toml)\n    \
                  mindful-server config --validate      # Check the configuration"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "mindful.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Backend choice offered by `init`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InitBackend {
    /// In-process store and local Ollama inference
    Memory,
    /// Hosted app backend for data, identity and inference
    Hosted,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Write a starter mindful.toml and .env.example
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// Which backend to configure
        #[arg(long, value_enum, default_value = "memory")]
        backend: InitBackend,

        /// Host address for the server
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the server
        #[arg(long, default_value = "3000")]
        port: u16,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
