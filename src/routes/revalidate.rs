/**
 * Revalidation Routes
 * Lets a page renderer ask when a path's content last changed
 */
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct RevalidationQuery {
    pub path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevalidationResponse {
    pub path: String,
    pub revalidated_at: Option<DateTime<Utc>>,
}

/// GET /api/revalidations?path=/blog
pub async fn last_revalidated(
    State(state): State<AppState>,
    Query(query): Query<RevalidationQuery>,
) -> Result<Json<RevalidationResponse>, ApiError> {
    let path = query
        .path
        .filter(|p| p.starts_with('/'))
        .ok_or_else(|| ApiError::BadRequest("Query parameter 'path' must start with '/'".to_string()))?;

    let revalidated_at = state.pages.last_revalidated(&path).await;
    Ok(Json(RevalidationResponse {
        path,
        revalidated_at,
    }))
}
