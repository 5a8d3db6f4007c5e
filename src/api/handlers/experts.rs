use crate::{
    AppState,
    experts::{ExpertCard, search_experts},
    types::Result,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ListExpertsQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// Experts best rated first, optionally filtered by search text.
pub async fn list_experts(
    State(state): State<AppState>,
    Query(query): Query<ListExpertsQuery>,
) -> Result<Json<Vec<ExpertCard>>> {
    let experts = state.experts.list_experts().await?;
    let experts = match query.q.as_deref() {
        Some(q) => search_experts(&experts, q),
        None => experts,
    };
    Ok(Json(experts.into_iter().map(ExpertCard::from).collect()))
}

pub async fn get_expert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExpertCard>> {
    let expert = state.experts.get_expert(&id).await?;
    Ok(Json(ExpertCard::from(expert)))
}
