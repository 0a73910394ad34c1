//! Calls into the JSON API without leaving the process.
//!
//! Requests go straight through the API router with `oneshot`, carrying the
//! caller's session cookie so the API applies its own admin check.

use axum::{
    body::{Body, Bytes},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde::{de::DeserializeOwned, Serialize};
use tower::ServiceExt;
use url::Url;

use super::ActionFailure;
use crate::error::ErrorResponse;
use crate::session::SESSION_COOKIE_NAME;

lazy_static::lazy_static! {
    static ref API_BASE: Url = Url::parse("http://localhost/").unwrap();
}

/// Percent-encoded request path for `segments`.
fn api_path(segments: &[&str]) -> String {
    let mut url = API_BASE.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.clear().extend(segments);
    }
    url.path().to_string()
}

#[derive(Clone)]
pub struct ApiClient {
    router: Router,
}

impl ApiClient {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        session: Option<&str>,
    ) -> Result<T, ActionFailure> {
        let bytes = self.call(Method::GET, segments, session, None).await?;
        decode(&bytes)
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        session: Option<&str>,
        body: &B,
    ) -> Result<T, ActionFailure> {
        let bytes = self
            .call(Method::POST, segments, session, Some(encode(body)?))
            .await?;
        decode(&bytes)
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        session: Option<&str>,
        body: &B,
    ) -> Result<T, ActionFailure> {
        let bytes = self
            .call(Method::PUT, segments, session, Some(encode(body)?))
            .await?;
        decode(&bytes)
    }

    pub async fn delete(&self, segments: &[&str], session: Option<&str>) -> Result<(), ActionFailure> {
        self.call(Method::DELETE, segments, session, None).await?;
        Ok(())
    }

    async fn call(
        &self,
        method: Method,
        segments: &[&str],
        session: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> Result<Bytes, ActionFailure> {
        let path = api_path(segments);
        let mut builder = Request::builder().method(method.clone()).uri(path.as_str());
        if let Some(token) = session {
            builder = builder.header(header::COOKIE, format!("{}={}", SESSION_COOKIE_NAME, token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json)),
            None => builder.body(Body::empty()),
        }
        .map_err(|e| ActionFailure::Failed(format!("Failed to build API request: {}", e)))?;

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| -> ActionFailure { match e {} })?;

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| ActionFailure::Failed(format!("Failed to read API response: {}", e)))?;

        if status.is_success() {
            tracing::debug!("API {} {} -> {}", method, path, status);
            return Ok(bytes);
        }

        tracing::warn!("API {} {} failed with {}", method, path, status);
        Err(failure_from_response(status, &bytes))
    }
}

fn encode<B: Serialize>(body: &B) -> Result<Vec<u8>, ActionFailure> {
    serde_json::to_vec(body)
        .map_err(|e| ActionFailure::Failed(format!("Failed to encode API request: {}", e)))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ActionFailure> {
    serde_json::from_slice(bytes)
        .map_err(|e| ActionFailure::Failed(format!("Unexpected API response: {}", e)))
}

/// Map an API error response onto the failure kinds forms understand.
fn failure_from_response(status: StatusCode, bytes: &[u8]) -> ActionFailure {
    let body: Option<ErrorResponse> = serde_json::from_slice(bytes).ok();
    let message = body
        .as_ref()
        .map(|b| b.message.clone())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

    match (status, body.and_then(|b| b.errors)) {
        (StatusCode::FORBIDDEN, _) | (StatusCode::UNAUTHORIZED, _) => ActionFailure::Unauthorized,
        (StatusCode::BAD_REQUEST, Some(errors)) => ActionFailure::Validation(errors),
        (StatusCode::NOT_FOUND, _) => ActionFailure::NotFound(message),
        _ => ActionFailure::Upstream { status, message },
    }
}
