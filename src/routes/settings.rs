/**
 * Settings Routes
 * Site-wide social links and SMTP settings
 */
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::models::{AppSettings, SocialLinks};
use crate::error::ApiError;
use crate::routes::{require_admin, AppState};
use crate::validation::{SettingsUpdate, SocialLinksUpdate};

// ============================================================================
// Response Types
// ============================================================================

/// SMTP settings as exposed over HTTP; the password never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpSettingsView {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub has_password: bool,
    pub secure: bool,
    pub from_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub social_links: SocialLinks,
    pub smtp_settings: SmtpSettingsView,
}

impl From<AppSettings> for SettingsResponse {
    fn from(settings: AppSettings) -> Self {
        let smtp = settings.smtp_settings;
        Self {
            social_links: settings.social_links,
            smtp_settings: SmtpSettingsView {
                host: smtp.host,
                port: smtp.port,
                user: smtp.user,
                has_password: !smtp.pass.is_empty(),
                secure: smtp.secure,
                from_email: smtp.from_email,
            },
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/settings
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<SettingsResponse>, ApiError> {
    Ok(Json(state.settings.get().await?.into()))
}

/// POST /api/settings - Partial merge (admin only)
pub async fn update_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SettingsUpdate>, JsonRejection>,
) -> Result<Json<SettingsResponse>, ApiError> {
    require_admin(&state, &headers).await?;
    let Json(payload) = payload?;
    let update = payload.validate()?;

    let saved = state.settings.update(update).await?;
    Ok(Json(saved.into()))
}

/// GET /api/settings/social
pub async fn get_social_links(
    State(state): State<AppState>,
) -> Result<Json<SocialLinks>, ApiError> {
    Ok(Json(state.settings.get().await?.social_links))
}

/// POST /api/settings/social (admin only)
pub async fn update_social_links(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SocialLinksUpdate>, JsonRejection>,
) -> Result<Json<SocialLinks>, ApiError> {
    require_admin(&state, &headers).await?;
    let Json(payload) = payload?;
    let update = payload.validate()?;

    Ok(Json(state.settings.update_social(update).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestApp;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::error::ErrorResponse;

    #[tokio::test]
    async fn test_get_settings_hides_password() {
        let app = TestApp::new();
        let cookie = app.admin_cookie();
        let (status, _) = app
            .send_json(
                Method::POST,
                "/api/settings",
                Some(&cookie),
                &json!({"smtpSettings": {"pass": "hunter2"}}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, bytes) = app.send(crate::test_support::request(Method::GET, "/api/settings", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!String::from_utf8_lossy(&bytes).contains("hunter2"));
        let body: SettingsResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.smtp_settings.has_password);
    }

    #[tokio::test]
    async fn test_blank_password_keeps_stored_password() {
        let app = TestApp::new();
        let cookie = app.admin_cookie();
        app.send_json(
            Method::POST,
            "/api/settings",
            Some(&cookie),
            &json!({"smtpSettings": {"pass": "hunter2"}}),
        )
        .await;
        let (status, _) = app
            .send_json(
                Method::POST,
                "/api/settings",
                Some(&cookie),
                &json!({"smtpSettings": {"host": "smtp.example.com", "pass": ""}}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let stored = app.state.settings.get().await.unwrap();
        assert_eq!(stored.smtp_settings.pass, "hunter2");
        assert_eq!(stored.smtp_settings.host, "smtp.example.com");
    }

    #[tokio::test]
    async fn test_update_settings_requires_admin() {
        let app = TestApp::new();
        let (status, _) = app
            .send_json(
                Method::POST,
                "/api/settings",
                None,
                &json!({"socialLinks": {"facebook": "https://facebook.com/x"}}),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_invalid_settings_report_dotted_fields() {
        let app = TestApp::new();
        let cookie = app.admin_cookie();
        let (status, bytes) = app
            .send_json(
                Method::POST,
                "/api/settings",
                Some(&cookie),
                &json!({"smtpSettings": {"port": -1}}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.errors.unwrap().contains("smtpSettings.port"));
    }

    #[tokio::test]
    async fn test_social_links_round_trip() {
        let app = TestApp::new();
        let cookie = app.admin_cookie();
        let (status, bytes) = app
            .send_json(
                Method::POST,
                "/api/settings/social",
                Some(&cookie),
                &json!({"instagram": "https://www.instagram.com/mindcare"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let links: SocialLinks = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(links.instagram, "https://www.instagram.com/mindcare");

        let (_, fetched) = app.get_json::<SocialLinks>("/api/settings/social").await;
        assert_eq!(fetched, links);
    }
}
