/**
 * Form Actions
 * Browser form submissions: authorize, validate, call the JSON API,
 * revalidate affected pages and redirect
 */
pub mod client;
pub mod contact;
pub mod posts;
pub mod testimonials;

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routes::AppState;
use crate::validation::FieldErrors;
pub use client::ApiClient;

/// Outcome of a form submission that did not redirect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl FormState {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            errors: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ActionFailure {
    #[error("Unauthorized: Admin privileges required.")]
    Unauthorized,

    #[error("Validation failed. Please check the fields.")]
    Validation(FieldErrors),

    #[error("{0}")]
    NotFound(String),

    #[error("API error ({status}): {message}")]
    Upstream { status: StatusCode, message: String },

    #[error("{0}")]
    Failed(String),
}

impl ActionFailure {
    pub fn status(&self) -> StatusCode {
        match self {
            ActionFailure::Unauthorized => StatusCode::FORBIDDEN,
            ActionFailure::Validation(_) => StatusCode::BAD_REQUEST,
            ActionFailure::NotFound(_) => StatusCode::NOT_FOUND,
            ActionFailure::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ActionFailure::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_form_state(self) -> FormState {
        let message = self.to_string();
        let errors = match self {
            ActionFailure::Validation(errors) => errors,
            _ => FieldErrors::general(message.clone()),
        };
        FormState {
            success: false,
            message,
            errors: Some(errors),
        }
    }
}

impl IntoResponse for ActionFailure {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Form action failed: {}", self);
        } else {
            tracing::warn!("Form action rejected: {}", self);
        }
        (status, Json(self.into_form_state())).into_response()
    }
}

/// State for the form endpoints: shared app handles plus the in-process API.
#[derive(Clone)]
pub struct ActionState {
    pub app: AppState,
    pub api: ApiClient,
}

/// Admin check done by every admin action before touching anything.
pub async fn check_admin(state: &ActionState, headers: &HeaderMap) -> Result<(), ActionFailure> {
    if state.app.sessions.is_admin_session(headers).await {
        Ok(())
    } else {
        Err(ActionFailure::Unauthorized)
    }
}

pub fn router(state: ActionState) -> Router {
    Router::new()
        .route("/admin/posts", post(posts::create_post))
        .route("/admin/posts/{slug}", post(posts::update_post))
        .route("/admin/posts/{slug}/delete", post(posts::delete_post))
        .route("/admin/testimonials", post(testimonials::create_testimonial))
        .route("/admin/testimonials/{id}", post(testimonials::update_testimonial))
        .route(
            "/admin/testimonials/{id}/delete",
            post(testimonials::delete_testimonial),
        )
        .route("/contact", post(contact::send_contact_message))
        .with_state(state)
}
