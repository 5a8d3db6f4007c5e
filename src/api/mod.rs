//! HTTP API Handlers and Routes
//!
//! This module provides the JSON API the MindfulSpace front end talks to,
//! built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Shell
//! - `GET /api/health` - Liveness probe
//! - `GET /api/me` - Signed-in user (`Authorization: Bearer <token>`), 401 when anonymous
//! - `GET /api/auth/login-url?return_to=` - Login redirect target
//!
//! ## Chat (`/api/chat/sessions`)
//! - `POST /api/chat/sessions` - Start a session (greeting only)
//! - `GET /api/chat/sessions/{id}` - Session snapshot
//! - `DELETE /api/chat/sessions/{id}` - End the session
//! - `POST /api/chat/sessions/{id}/messages` - Send `{content}`; 400 if blank, 409 while a reply is pending
//! - `POST /api/chat/sessions/{id}/cancel` - Cancel the pending reply
//! - `POST /api/chat/sessions/{id}/acknowledge` - Clear a failed state
//! - `POST /api/chat/sessions/{id}/crisis/dismiss` - Hide the crisis banner
//!
//! ## Community (`/api/community`)
//! - `GET /api/community/categories` - Categories with labels and icons
//! - `GET /api/community/posts?category=&q=` - Posts, newest first
//! - `POST /api/community/posts` - Create a post
//! - `GET /api/community/posts/{id}` - Post detail
//! - `GET|POST /api/community/posts/{id}/comments` - Comments, oldest first / add one
//! - `POST /api/community/posts/{id}/reactions` - `{kind}`: heart, hug, same, strength
//! - `POST /api/community/comments/{id}/reactions` - `{kind}`: heart, hug
//!
//! ## Experts (`/api/experts`)
//! - `GET /api/experts?q=` - Directory, best rated first
//! - `GET /api/experts/{id}` - Expert detail
//!
//! Errors are returned as `{"error": "<message>"}` with the status mapped
//! from [`AppError`](crate::types::AppError).

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
