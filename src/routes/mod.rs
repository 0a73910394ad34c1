/**
 * Routes Module
 * REST handlers for posts, testimonials, settings, auth and health
 */
pub mod auth;
pub mod health;
pub mod posts;
pub mod revalidate;
pub mod settings;
pub mod testimonials;

use axum::{
    http::HeaderMap,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::cache::PageCache;
use crate::config::Config;
use crate::db::{PostRepository, SettingsRepository, TestimonialRepository};
use crate::error::ApiError;
use crate::session::SessionCodec;
use crate::uploads::ImageStore;

/// Shared handles for every handler; cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionCodec>,
    pub posts: Arc<dyn PostRepository>,
    pub testimonials: Arc<dyn TestimonialRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub images: Arc<dyn ImageStore>,
    pub pages: Arc<PageCache>,
}

/// Gate for mutating routes: only an admin session passes.
pub async fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    if state.sessions.is_admin_session(headers).await {
        Ok(())
    } else {
        tracing::warn!("Rejected mutation without an admin session");
        Err(ApiError::Forbidden)
    }
}

/// The JSON API plus health checks.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/session", get(auth::session))
        .route("/api/auth/status", get(auth::status))
        .route(
            "/api/posts",
            get(posts::list_posts).post(posts::create_post),
        )
        .route(
            "/api/posts/{slug}",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route(
            "/api/testimonials",
            get(testimonials::list_testimonials).post(testimonials::create_testimonial),
        )
        .route(
            "/api/testimonials/{id}",
            get(testimonials::get_testimonial)
                .put(testimonials::update_testimonial)
                .delete(testimonials::delete_testimonial),
        )
        .route(
            "/api/settings",
            get(settings::get_settings).post(settings::update_settings),
        )
        .route(
            "/api/settings/social",
            get(settings::get_social_links).post(settings::update_social_links),
        )
        .route("/api/revalidations", get(revalidate::last_revalidated))
        .route("/health", get(health::health_ping))
        .route("/health/detailed", get(health::health_detailed))
        .with_state(state)
}
