//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Identity shell (`/api/me`, login redirect).
pub mod auth;
/// Companion chat sessions.
pub mod chat;
/// Forum posts, comments and reactions.
pub mod community;
/// Experts directory.
pub mod experts;
/// Liveness probe.
pub mod health;
