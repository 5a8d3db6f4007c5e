use crate::{
    AppState,
    auth::{UserProfile, middleware::BearerToken},
    types::Result,
};
use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserProfile,
    pub display_name: String,
}

/// The signed-in user behind the bearer token; 401 when anonymous.
pub async fn me(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<MeResponse>> {
    let user = state.auth.me(&token).await?;
    let display_name = user.display_name().to_string();
    Ok(Json(MeResponse { user, display_name }))
}

#[derive(Debug, Deserialize)]
pub struct LoginUrlQuery {
    #[serde(default = "default_return_to")]
    pub return_to: String,
}

fn default_return_to() -> String {
    "/".to_string()
}

#[derive(Debug, Serialize)]
pub struct LoginUrlResponse {
    pub url: String,
}

/// Where the front end should send an anonymous visitor.
pub async fn login_url(
    State(state): State<AppState>,
    Query(query): Query<LoginUrlQuery>,
) -> Json<LoginUrlResponse> {
    Json(LoginUrlResponse {
        url: state.auth.login_url(&query.return_to),
    })
}
