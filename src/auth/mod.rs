//! Authentication shell
//!
//! Identity is owned by an external provider. The server only needs to know
//! who is behind a bearer token (for the `/api/me` shell endpoint) and where
//! to send anonymous visitors to log in.
//!
//! # Module Structure
//!
//! - [`auth::middleware`](crate::auth::middleware) - bearer-token extractor for handlers
//!
//! # Providers
//!
//! - [`HostedBackend`](crate::backend::HostedBackend) resolves tokens with `GET {base}/auth/me`
//! - [`LocalAuth`] keeps a fixed token table for local development and tests

/// Bearer-token extraction for protected routes.
pub mod middleware;

use crate::types::{AppError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub email: String,
}

impl UserProfile {
    /// Name shown in the page shell, falling back to the email address.
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Profile behind `token`; `AppError::Auth` when the token is not recognised.
    async fn me(&self, token: &str) -> Result<UserProfile>;

    async fn is_authenticated(&self, token: &str) -> bool {
        self.me(token).await.is_ok()
    }

    /// Where to send an anonymous visitor, returning to `return_to` afterwards.
    fn login_url(&self, return_to: &str) -> String;
}

/// In-process token table.
#[derive(Default)]
pub struct LocalAuth {
    users: RwLock<HashMap<String, UserProfile>>,
}

impl LocalAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, token: impl Into<String>, profile: UserProfile) -> Self {
        self.users.write().insert(token.into(), profile);
        self
    }
}

#[async_trait]
impl AuthProvider for LocalAuth {
    async fn me(&self, token: &str) -> Result<UserProfile> {
        self.users
            .read()
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::Auth("Unknown or expired token".to_string()))
    }

    fn login_url(&self, return_to: &str) -> String {
        // Only the path and query of the parsed URL are kept.
        Url::parse_with_params("http://localhost/login", [("from_url", return_to)])
            .map(|url| format!("{}?{}", url.path(), url.query().unwrap_or_default()))
            .unwrap_or_else(|_| "/login".to_string())
    }
}
