//! Inference client abstraction and provider selection
//!
//! The chat core needs exactly one thing from a model: turn a prompt into a
//! reply. Providers:
//! - **Hosted**: the hosted backend's `InvokeLLM` integration (default)
//! - **Ollama**: local inference through an Ollama server (feature `ollama`)

use crate::backend::{HostedBackend, HostedBackendConfig};
use crate::types::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Single-turn, non-streaming text generation.
///
/// Implementations must be safe to retry; the chat core itself never retries.
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Generate a reply for `prompt`.
    async fn invoke(&self, prompt: &str) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// Hosted backend `integrations/Core/InvokeLLM`
    Hosted(HostedBackendConfig),

    /// Ollama local LLM provider
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::Ollama {
    ///     base_url: "http://localhost:11434".to_string(),
    ///     model: "llama3.2".to_string(),
    /// };
    /// ```
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the provider was compiled out or its
    /// configuration is invalid.
    pub async fn create_client(&self) -> Result<Arc<dyn InferenceService>> {
        match self {
            Provider::Hosted(config) => Ok(Arc::new(HostedBackend::new(config.clone())?)),

            #[cfg(feature = "ollama")]
            Provider::Ollama { base_url, model } => Ok(Arc::new(
                super::ollama::OllamaInference::new(base_url.clone(), model.clone()).await?,
            )),

            #[cfg(not(feature = "ollama"))]
            Provider::Ollama { model, .. } => Err(crate::types::AppError::Configuration(format!(
                "Ollama provider requested for model '{}' but the `ollama` feature is disabled",
                model
            ))),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Hosted(_) => "Hosted",
            Provider::Ollama { .. } => "Ollama",
        }
    }

    /// Check if this provider is available in the current build
    pub fn is_available(&self) -> bool {
        match self {
            Provider::Hosted(_) => true,
            Provider::Ollama { .. } => cfg!(feature = "ollama"),
        }
    }
}
