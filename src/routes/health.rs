/**
 * Health Routes
 * Liveness ping and a detailed view with uptime and store sizes
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::routes::AppState;

// Track server start time for uptime calculation
lazy_static::lazy_static! {
    static ref SERVER_START: Instant = Instant::now();
}

/// Initialize the server start time
pub fn init_start_time() {
    lazy_static::initialize(&SERVER_START);
}

/// Simple health response
#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleHealthResponse {
    pub status: String,
}

/// Item counts per content store
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreCounts {
    pub posts: usize,
    pub testimonials: usize,
}

/// Detailed health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stores: Option<StoreCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health - Simple health ping
pub async fn health_ping() -> impl IntoResponse {
    Json(SimpleHealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /health/detailed - Uptime plus a read from every content store
pub async fn health_detailed(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = SERVER_START.elapsed().as_secs();

    let counts = async {
        Ok::<_, crate::db::StoreError>(StoreCounts {
            posts: state.posts.count().await?,
            testimonials: state.testimonials.count().await?,
        })
    }
    .await;

    let (status_code, status, stores, error) = match counts {
        Ok(counts) => (StatusCode::OK, "healthy", Some(counts), None),
        Err(e) => {
            tracing::error!("Health check store read failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "unhealthy",
                None,
                Some(e.to_string()),
            )
        }
    };

    (
        status_code,
        Json(DetailedHealthResponse {
            status: status.to_string(),
            timestamp: Utc::now(),
            uptime,
            environment: state.config.environment.clone(),
            stores,
            error,
        }),
    )
}
