//! Community forum handlers.

use crate::{
    AppState,
    community::{CategoryInfo, CommunityOrchestrator, search_posts},
    types::{
        CategoryFilter, CommentReaction, ForumComment, ForumPost, NewComment, NewPost,
        PostReaction, Result,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

pub async fn list_categories() -> Json<Vec<CategoryInfo>> {
    Json(CommunityOrchestrator::categories())
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    /// A category value, or `all`
    #[serde(default)]
    pub category: Option<String>,
    /// Search text matched against title and content
    #[serde(default)]
    pub q: Option<String>,
}

/// Posts newest first, optionally narrowed by category and search text.
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<Vec<ForumPost>>> {
    let filter: CategoryFilter = query.category.as_deref().unwrap_or("all").parse()?;
    let posts = state.community.list_posts(filter).await?;

    Ok(Json(match query.q.as_deref() {
        Some(q) => search_posts(&posts, q),
        None => posts,
    }))
}

pub async fn create_post(
    State(state): State<AppState>,
    Json(payload): Json<NewPost>,
) -> Result<(StatusCode, Json<ForumPost>)> {
    let post = state.community.create_post(payload).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ForumPost>> {
    Ok(Json(state.community.get_post(&id).await?))
}

/// Comments on a post, oldest first. 404 if the post does not exist.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<Vec<ForumComment>>> {
    state.community.get_post(&post_id).await?;
    Ok(Json(state.community.list_comments(&post_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

pub async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<ForumComment>)> {
    state.community.get_post(&post_id).await?;
    let comment = state
        .community
        .create_comment(NewComment {
            post_id,
            content: payload.content,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

#[derive(Debug, Deserialize)]
pub struct PostReactionRequest {
    pub kind: PostReaction,
}

pub async fn react_to_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<PostReactionRequest>,
) -> Result<Json<ForumPost>> {
    Ok(Json(state.community.react(&id, payload.kind).await?))
}

#[derive(Debug, Deserialize)]
pub struct CommentReactionRequest {
    pub kind: CommentReaction,
}

pub async fn react_to_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CommentReactionRequest>,
) -> Result<Json<ForumComment>> {
    Ok(Json(
        state.community.react_to_comment(&id, payload.kind).await?,
    ))
}
