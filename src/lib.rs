//! # MindfulSpace Server
//!
//! Service core of a mental-wellness companion: an AI chat with crisis-phrase
//! detection, an anonymous community forum and an experts directory.
//!
//! ## Overview
//!
//! MindfulSpace can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `mindful-server` binary
//! 2. **As a library** - Drive the orchestrators from your own code
//!
//! Persistence, identity and model access are external collaborators behind
//! traits ([`EntityStore`](store::EntityStore), [`AuthProvider`](auth::AuthProvider),
//! [`InferenceService`](llm::InferenceService)); the crate ships an in-memory
//! store, a hosted-backend REST client and an Ollama client.
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use mindful::chat::{ChatOrchestrator, ChatSession};
//! use mindful::llm::Provider;
//!
//! let provider = Provider::Ollama {
//!     base_url: "http://localhost:11434".to_string(),
//!     model: "llama3.2".to_string(),
//! };
//! let chat = ChatOrchestrator::new(provider.create_client().await?);
//! let session = ChatSession::new();
//! let outcome = chat.submit(&session, "I can't sleep before exams").await?;
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference (default) |
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`auth`] - Identity provider trait and bearer-token extraction
//! - [`backend`] - Hosted backend REST client
//! - [`chat`] - Chat sessions, orchestrator and registry
//! - [`cli`] - Command-line interface
//! - [`community`] - Forum posts, comments and reactions
//! - [`crisis`] - Crisis phrase detection and resources
//! - [`experts`] - Experts directory
//! - [`llm`] - Inference providers
//! - [`store`] - Entity store trait and in-memory store
//! - [`types`] - Domain types and error handling
//! - [`utils`] - Configuration

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Identity provider trait and bearer-token extraction.
pub mod auth;
/// Hosted backend REST client (entities, inference, auth).
pub mod backend;
/// Companion chat.
pub mod chat;
/// Command-line interface.
pub mod cli;
/// Anonymous community forum.
pub mod community;
/// Crisis phrase detection.
pub mod crisis;
/// Experts directory.
pub mod experts;
/// Inference provider clients and abstractions.
pub mod llm;
/// Entity store abstraction and in-memory implementation.
pub mod store;
/// Core types (domain models, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use chat::{ChatOrchestrator, ChatSession, SessionRegistry};
pub use community::CommunityOrchestrator;
pub use experts::ExpertDirectory;
pub use llm::{InferenceService, Provider};
pub use store::{EntityStore, InMemoryEntityStore};
pub use types::{AppError, Result};
pub use utils::toml_config::MindfulConfig;

use crate::auth::{AuthProvider, LocalAuth};
use crate::backend::HostedBackend;
use crate::community::AnonymousNamer;
use crate::crisis::{CrisisDetector, CrisisResources};
use crate::utils::toml_config::BackendKind;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<MindfulConfig>,
    /// Live chat sessions
    pub sessions: Arc<SessionRegistry>,
    /// Chat turn orchestration
    pub chat: Arc<ChatOrchestrator>,
    /// Forum operations
    pub community: Arc<CommunityOrchestrator>,
    /// Experts directory
    pub experts: Arc<ExpertDirectory>,
    /// Identity provider for the page shell
    pub auth: Arc<dyn AuthProvider>,
    /// Banner contents shown after a crisis detection
    pub crisis_resources: Arc<CrisisResources>,
}

impl AppState {
    /// Wires the orchestrators around the given collaborators.
    pub fn new(
        config: MindfulConfig,
        inference: Arc<dyn InferenceService>,
        store: Arc<dyn EntityStore>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        let detector = CrisisDetector::new().with_extra_phrases(&config.chat.extra_crisis_phrases);
        let chat = ChatOrchestrator::new(inference)
            .with_detector(detector)
            .with_timeout(config.chat.inference_timeout())
            .with_history_window(config.chat.history_window);

        let namer = match config.community.name_seed {
            Some(seed) => AnonymousNamer::seeded(seed),
            None => AnonymousNamer::from_entropy(),
        };
        let community = CommunityOrchestrator::new(store.clone())
            .with_namer(namer)
            .with_reaction_retry_limit(config.community.reaction_retry_limit);

        let crisis_resources = CrisisResources::with_hotline(&config.chat.crisis_hotline);

        Self {
            config: Arc::new(config),
            sessions: Arc::new(SessionRegistry::new()),
            chat: Arc::new(chat),
            community: Arc::new(community),
            experts: Arc::new(ExpertDirectory::new(store)),
            auth,
            crisis_resources: Arc::new(crisis_resources),
        }
    }

    /// Builds the collaborators named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` if the backend or inference
    /// provider cannot be set up.
    pub async fn from_config(config: MindfulConfig) -> Result<Self> {
        let inference = config.inference_provider()?.create_client().await?;

        let (store, auth): (Arc<dyn EntityStore>, Arc<dyn AuthProvider>) = match config
            .backend
            .kind
        {
            BackendKind::Memory => (
                Arc::new(InMemoryEntityStore::new()),
                Arc::new(LocalAuth::new()),
            ),
            BackendKind::Hosted => {
                let backend = Arc::new(HostedBackend::new(config.hosted_backend()?)?);
                (backend.clone(), backend)
            }
        };

        Ok(Self::new(config, inference, store, auth))
    }
}
