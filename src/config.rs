//! Runtime configuration read from the environment (and `.env` via dotenvy).

use bcrypt::{hash, DEFAULT_COST};
use std::path::PathBuf;

/// Development-only signing secret. `run()` refuses to start in production with it.
pub const DEFAULT_SESSION_SECRET: &str = "dev-session-secret-change-in-production";

/// One day, the lifetime of an admin session.
pub const DEFAULT_SESSION_MAX_AGE_SECS: i64 = 60 * 60 * 24;

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub admin_email: String,
    /// bcrypt hash of the admin password.
    pub admin_password_hash: String,
    pub session_secret: String,
    pub session_max_age_secs: i64,
    /// Directory uploaded blog images are written to and served from.
    pub upload_dir: PathBuf,
    pub allowed_origins: Vec<String>,
    pub contact_recipient: String,
    pub seed_content: bool,
}

impl Config {
    /// Build the configuration from environment variables, falling back to
    /// development defaults for anything unset.
    pub fn from_env() -> Self {
        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        // ADMIN_HASH_PASSWORD wins; a plain ADMIN_PASSWORD is hashed once here.
        let admin_password_hash = match std::env::var("ADMIN_HASH_PASSWORD") {
            Ok(hashed) => hashed,
            Err(_) => {
                let plain =
                    std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "password".to_string());
                hash(&plain, DEFAULT_COST).unwrap_or_else(|e| {
                    tracing::error!("Failed to hash admin password: {}", e);
                    String::new()
                })
            }
        };

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .or_else(|| std::env::var("FRONTEND_ORIGIN").ok().map(|o| vec![o]))
            .unwrap_or_else(|| {
                vec![
                    "http://localhost:9002".to_string(),
                    "http://127.0.0.1:9002".to_string(),
                ]
            });

        Self {
            environment,
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3001),
            admin_email: std::env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@example.com".to_string()),
            admin_password_hash,
            session_secret: std::env::var("SESSION_SECRET")
                .unwrap_or_else(|_| DEFAULT_SESSION_SECRET.to_string()),
            session_max_age_secs: std::env::var("SESSION_MAX_AGE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs: &i64| *secs > 0)
                .unwrap_or(DEFAULT_SESSION_MAX_AGE_SECS),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public/uploads/blog")),
            allowed_origins,
            contact_recipient: std::env::var("CONTACT_FORM_RECIPIENT_EMAIL")
                .unwrap_or_else(|_| "info@slatenchalkmindcare.com".to_string()),
            seed_content: std::env::var("SEED_CONTENT")
                .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(true),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Configuration for unit tests: fast bcrypt cost, uploads in `upload_dir`.
    #[cfg(test)]
    pub(crate) fn for_tests(upload_dir: PathBuf) -> Self {
        Self {
            environment: "test".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            admin_email: "admin@example.com".to_string(),
            admin_password_hash: hash("password", 4).expect("hash test password"),
            session_secret: "test-secret".to_string(),
            session_max_age_secs: DEFAULT_SESSION_MAX_AGE_SECS,
            upload_dir,
            allowed_origins: vec!["http://localhost:9002".to_string()],
            contact_recipient: "info@example.com".to_string(),
            seed_content: true,
        }
    }
}
