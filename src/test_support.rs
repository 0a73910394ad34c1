//! Router-level helpers shared by the handler and action tests.

use axum::{
    body::{Body, Bytes},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::config::Config;
use crate::routes::AppState;
use crate::session::{SessionIdentity, SESSION_COOKIE_NAME};
use crate::uploads::ImageStore;
use crate::{build_state, build_state_with_images, create_app};

const BOUNDARY: &str = "----mindcare-test-boundary";

/// Seeded app with uploads in a private temp dir.
pub(crate) struct TestApp {
    pub state: AppState,
    router: Router,
    upload_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        let state = build_state(Config::for_tests(upload_dir.path().to_path_buf()));
        Self::from_state(state, upload_dir)
    }

    /// Same app, with the post store and the actions sharing the image store
    /// `images` builds for the upload dir.
    pub fn with_images(images: impl FnOnce(&Path) -> Arc<dyn ImageStore>) -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        let images = images(upload_dir.path());
        let state =
            build_state_with_images(Config::for_tests(upload_dir.path().to_path_buf()), images);
        Self::from_state(state, upload_dir)
    }

    /// Seeded app after `customize` has replaced parts of its state.
    pub fn with_state(customize: impl FnOnce(&mut AppState)) -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        let mut state = build_state(Config::for_tests(upload_dir.path().to_path_buf()));
        customize(&mut state);
        Self::from_state(state, upload_dir)
    }

    fn from_state(state: AppState, upload_dir: TempDir) -> Self {
        Self {
            router: create_app(state.clone()),
            state,
            upload_dir,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        self.upload_dir.path()
    }

    /// `Cookie` header value for a freshly signed admin session.
    pub fn admin_cookie(&self) -> String {
        let identity = SessionIdentity::admin(self.state.config.admin_email.clone());
        let token = self.state.sessions.encode(&identity).unwrap();
        format!("{}={}", SESSION_COOKIE_NAME, token)
    }

    pub async fn response(&self, req: Request<Body>) -> Response {
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Bytes) {
        let res = self.response(req).await;
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, uri: &str) -> (StatusCode, T) {
        let (status, bytes) = self.send(request(Method::GET, uri, None)).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    pub async fn send_json(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        json: &impl Serialize,
    ) -> (StatusCode, Bytes) {
        self.send_raw(method, uri, cookie, &serde_json::to_string(json).unwrap())
            .await
    }

    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: &str,
    ) -> (StatusCode, Bytes) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }
}

/// Bodiless request, optionally carrying a `Cookie` header.
pub(crate) fn request(method: Method, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// URL-encoded form POST.
pub(crate) fn form_request(uri: &str, cookie: Option<&str>, fields: &[(&str, &str)]) -> Request<Body> {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish();
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

/// Multipart form POST with text fields and an optional `image` file part.
pub(crate) fn multipart_request(
    uri: &str,
    cookie: Option<&str>,
    fields: &[(&str, &str)],
    image: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::post(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}
