//! MindCare site backend - library for app logic and testing

pub mod actions;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod routes;
pub mod session;
pub mod uploads;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware, Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, trace::TraceLayer,
};

use actions::{ActionState, ApiClient};
use cache::PageCache;
use config::Config;
use db::models::AppSettings;
use db::{InMemoryPostStore, InMemorySettingsStore, InMemoryTestimonialStore};
use routes::AppState;
use session::SessionCodec;
use uploads::{DiskImageStore, ImageStore};

/// JSON API request cap.
const API_BODY_LIMIT: usize = 2 * 1024 * 1024;
/// Form cap: one image plus the text fields.
const FORM_BODY_LIMIT: usize = uploads::MAX_FILE_SIZE + 1024 * 1024;

/// Configure CORS from the configured origins.
pub fn configure_cors(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin {}: {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::COOKIE,
        ])
        .allow_credentials(true)
}

/// Wire the stores, session codec, image store and page cache for `config`.
pub fn build_state(config: Config) -> AppState {
    let images: Arc<dyn ImageStore> = Arc::new(DiskImageStore::new(config.upload_dir.clone()));
    build_state_with_images(config, images)
}

/// Like `build_state`, with every image write and delete going through `images`.
pub fn build_state_with_images(config: Config, images: Arc<dyn ImageStore>) -> AppState {
    let sessions = Arc::new(SessionCodec::new(
        &config.session_secret,
        config.session_max_age_secs,
        config.is_production(),
    ));

    let (posts, testimonials) = if config.seed_content {
        (
            InMemoryPostStore::seeded(images.clone()),
            InMemoryTestimonialStore::seeded(),
        )
    } else {
        (
            InMemoryPostStore::new(images.clone()),
            InMemoryTestimonialStore::new(),
        )
    };

    AppState {
        config: Arc::new(config),
        sessions,
        posts: Arc::new(posts),
        testimonials: Arc::new(testimonials),
        settings: Arc::new(InMemorySettingsStore::new(AppSettings::default())),
        images,
        pages: Arc::new(PageCache::new()),
    }
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors(&state.config);
    tracing::info!("CORS configured for {} origin(s)", state.config.allowed_origins.len());

    let api = routes::api_router(state.clone());
    let actions = actions::router(ActionState {
        app: state.clone(),
        api: ApiClient::new(api.clone()),
    });

    Router::new()
        .merge(api.layer(RequestBodyLimitLayer::new(API_BODY_LIMIT)))
        .merge(
            actions
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(FORM_BODY_LIMIT)),
        )
        .nest_service(uploads::PUBLIC_PREFIX, ServeDir::new(&state.config.upload_dir))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br automatically
        .layer(CompressionLayer::new())
        .layer(cors)
}

/// Run the server (used by main).
pub async fn run() {
    dotenvy::dotenv().ok();

    // Guards MUST be held for the programme's lifetime; dropping them early
    // shuts down background log-writer threads and loses buffered log lines.
    let _log_guards = logging::init(&logging::config::LoggingConfig::from_env());

    routes::health::init_start_time();

    let config = Config::from_env();

    // Refuse to start in production with the insecure default session secret.
    if config.is_production() {
        if config.session_secret.is_empty()
            || config.session_secret == config::DEFAULT_SESSION_SECRET
        {
            panic!(
                "FATAL: SESSION_SECRET must be set to a secure, unique value in production. \
                 Refusing to start with the default secret."
            );
        }

        // Warn (don't panic) about default admin credentials in production.
        let admin_password_set = std::env::var("ADMIN_HASH_PASSWORD").is_ok()
            || std::env::var("ADMIN_PASSWORD").is_ok();

        if config.admin_email == "admin@example.com" {
            tracing::warn!(
                "SECURITY: ADMIN_EMAIL is using an insecure default. \
                 Set ADMIN_EMAIL env var to a real address."
            );
        }
        if !admin_password_set {
            tracing::warn!(
                "SECURITY: Neither ADMIN_HASH_PASSWORD nor ADMIN_PASSWORD is set. \
                 The fallback default password 'password' is insecure. \
                 Set ADMIN_HASH_PASSWORD to a bcrypt hash of a strong password."
            );
        }
    }

    if let Err(e) = tokio::fs::create_dir_all(&config.upload_dir).await {
        tracing::error!(
            "Failed to create upload directory {}: {}",
            config.upload_dir.display(),
            e
        );
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid HOST/PORT configuration");

    let app = create_app(build_state(config));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app).await.expect("Server error");
}
