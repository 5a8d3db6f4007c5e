//! Inference Providers
//!
//! The chat orchestrator talks to models only through [`InferenceService`]:
//! one prompt in, one reply out. Which backend answers is chosen at startup
//! from the `[inference]` section of `mindful.toml`.
//!
//! # Supported Providers
//!
//! - `hosted` - the hosted backend's `InvokeLLM` integration
//! - `ollama` - a local Ollama server (Cargo feature `ollama`, on by default)
//!
//! # Example
//!
//! ```ignore
//! use mindful::llm::Provider;
//!
//! let provider = Provider::Ollama {
//!     base_url: "http://localhost:11434".to_string(),
//!     model: "llama3.2".to_string(),
//! };
//! let client = provider.create_client().await?;
//! let reply = client.invoke("How are you?").await?;
//! ```

/// Inference trait and provider selection.
pub mod client;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use client::{InferenceService, Provider};
