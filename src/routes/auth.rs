/**
 * Authentication Routes
 * Single admin credential exchanged for a signed session cookie
 */
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use bcrypt::verify;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::AppState;
use crate::session::{cookie_value, SessionIdentity, SESSION_COOKIE_NAME};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub email: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: SessionUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Response for GET /api/auth/session
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub is_logged_in: bool,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusUser {
    pub id: String,
    pub email: String,
    pub is_admin: bool,
}

/// Response for GET /api/auth/status
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub logged_in: bool,
    pub user: Option<StatusUser>,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Check a password against the configured bcrypt hash off the async executor.
async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    match tokio::task::spawn_blocking(move || verify(&password, &hash)).await {
        Ok(Ok(valid)) => Ok(valid),
        Ok(Err(e)) => {
            tracing::error!("Password verification error: {}", e);
            Ok(false)
        }
        Err(e) => Err(ApiError::Internal(format!(
            "spawn_blocking panic during verify: {}",
            e
        ))),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;

    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let email_matches = payload
        .email
        .trim()
        .eq_ignore_ascii_case(&state.config.admin_email);
    let password_matches =
        verify_password(payload.password, state.config.admin_password_hash.clone()).await?;

    if !(email_matches && password_matches) {
        tracing::warn!("Login failed for email: {}", payload.email);
        return Err(ApiError::Unauthenticated);
    }

    let identity = SessionIdentity::admin(state.config.admin_email.clone());
    let token = state
        .sessions
        .encode(&identity)
        .map_err(|e| ApiError::Internal(format!("Failed to sign session: {}", e)))?;

    tracing::info!("Admin {} logged in", identity.email);
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, state.sessions.session_cookie(&token))],
        Json(LoginResponse {
            message: "Login successful".to_string(),
            user: SessionUser {
                email: identity.email,
                is_admin: true,
            },
        }),
    ))
}

/// POST /api/auth/logout
/// Idempotent: revokes the presented session (if any) and clears the cookie.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = cookie_value(&headers, SESSION_COOKIE_NAME) {
        state.sessions.revoke(token).await;
    }

    tracing::info!("Session logged out");
    (
        StatusCode::OK,
        [(header::SET_COOKIE, state.sessions.clear_cookie())],
        Json(LogoutResponse {
            message: "Logout successful".to_string(),
        }),
    )
}

/// GET /api/auth/session
pub async fn session(State(state): State<AppState>, headers: HeaderMap) -> Json<SessionResponse> {
    let response = match state.sessions.identity(&headers).await {
        Some(identity) => SessionResponse {
            is_logged_in: true,
            is_admin: identity.is_admin,
            email: Some(identity.email),
        },
        None => SessionResponse {
            is_logged_in: false,
            is_admin: false,
            email: None,
        },
    };
    Json(response)
}

/// GET /api/auth/status
pub async fn status(State(state): State<AppState>, headers: HeaderMap) -> Json<StatusResponse> {
    let user = state
        .sessions
        .identity(&headers)
        .await
        .map(|identity| StatusUser {
            id: format!("user-{}", identity.email),
            email: identity.email,
            is_admin: identity.is_admin,
        });

    Json(StatusResponse {
        logged_in: user.is_some(),
        user,
    })
}
