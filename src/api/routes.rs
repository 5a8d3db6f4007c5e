use crate::AppState;
use crate::api::handlers::{auth, chat, community, experts, health};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Routes relative to `/api`.
pub fn create_router() -> Router<AppState> {
    let shell_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/me", get(auth::me))
        .route("/auth/login-url", get(auth::login_url));

    let chat_routes = Router::new()
        .route("/chat/sessions", post(chat::create_session))
        .route(
            "/chat/sessions/{id}",
            get(chat::get_session).delete(chat::end_session),
        )
        .route("/chat/sessions/{id}/messages", post(chat::send_message))
        .route("/chat/sessions/{id}/cancel", post(chat::cancel_request))
        .route(
            "/chat/sessions/{id}/acknowledge",
            post(chat::acknowledge_failure),
        )
        .route(
            "/chat/sessions/{id}/crisis/dismiss",
            post(chat::dismiss_crisis),
        );

    let community_routes = Router::new()
        .route("/community/categories", get(community::list_categories))
        .route(
            "/community/posts",
            get(community::list_posts).post(community::create_post),
        )
        .route("/community/posts/{id}", get(community::get_post))
        .route(
            "/community/posts/{id}/comments",
            get(community::list_comments).post(community::create_comment),
        )
        .route(
            "/community/posts/{id}/reactions",
            post(community::react_to_post),
        )
        .route(
            "/community/comments/{id}/reactions",
            post(community::react_to_comment),
        );

    let expert_routes = Router::new()
        .route("/experts", get(experts::list_experts))
        .route("/experts/{id}", get(experts::get_expert));

    shell_routes
        .merge(chat_routes)
        .merge(community_routes)
        .merge(expert_routes)
}

/// The full application: API under `/api` with tracing and CORS layers.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", create_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
