/**
 * Post Routes
 * CRUD API endpoints for blog posts, keyed by slug
 */
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::db::models::Post;
use crate::error::ApiError;
use crate::routes::{require_admin, AppState};
use crate::validation::PostInput;

fn post_not_found() -> ApiError {
    ApiError::NotFound("Post not found".to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/posts - All posts, newest first
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(state.posts.list().await?))
}

/// GET /api/posts/{slug}
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Post>, ApiError> {
    state
        .posts
        .get(&slug)
        .await?
        .map(Json)
        .ok_or_else(post_not_found)
}

/// POST /api/posts - Create a post (admin only)
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PostInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    require_admin(&state, &headers).await?;
    let Json(payload) = payload?;
    let input = payload.validate()?;

    let post = state.posts.create(input).await?;
    tracing::info!("Post created via API: {}", post.slug);
    Ok((StatusCode::CREATED, Json(post)))
}

/// PUT /api/posts/{slug} - Replace a post's fields (admin only)
///
/// The slug in the response may differ from the path when the title changed.
pub async fn update_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<PostInput>, JsonRejection>,
) -> Result<Json<Post>, ApiError> {
    require_admin(&state, &headers).await?;
    let Json(payload) = payload?;
    let input = payload.validate()?;

    let post = state
        .posts
        .update(&slug, input)
        .await?
        .ok_or_else(post_not_found)?;
    tracing::info!("Post updated via API: {} -> {}", slug, post.slug);
    Ok(Json(post))
}

/// DELETE /api/posts/{slug} (admin only)
pub async fn delete_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    require_admin(&state, &headers).await?;

    if state.posts.delete(&slug).await? {
        tracing::info!("Post deleted via API: {}", slug);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(post_not_found())
    }
}
