/**
 * Session codec
 * Signed admin session tokens carried in the `auth_session` cookie
 */
use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;

pub const SESSION_COOKIE_NAME: &str = "auth_session";

/// Identity reconstructed from the session cookie on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    pub email: String,
    pub is_admin: bool,
    /// Milliseconds since the Unix epoch.
    pub logged_in_at: i64,
}

impl SessionIdentity {
    pub fn admin(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            is_admin: true,
            logged_in_at: Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    email: String,
    #[serde(rename = "isAdmin")]
    is_admin: bool,
    #[serde(rename = "loggedInAt")]
    logged_in_at: i64,
    iat: i64,
    exp: i64,
}

pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    max_age: Duration,
    secure_cookie: bool,
    /// SHA-256 of revoked tokens -> token expiry (unix seconds).
    revoked: RwLock<HashMap<String, i64>>,
}

fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl SessionCodec {
    pub fn new(secret: &str, max_age_secs: i64, secure_cookie: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            max_age: Duration::seconds(max_age_secs),
            secure_cookie,
            revoked: RwLock::new(HashMap::new()),
        }
    }

    pub fn max_age_secs(&self) -> i64 {
        self.max_age.num_seconds()
    }

    /// Sign an identity into a cookie value. The token expires `max_age`
    /// after `logged_in_at`.
    pub fn encode(&self, identity: &SessionIdentity) -> Result<String, jsonwebtoken::errors::Error> {
        let issued = identity.logged_in_at.div_euclid(1000);
        let claims = SessionClaims {
            sub: identity.email.clone(),
            email: identity.email.clone(),
            is_admin: identity.is_admin,
            logged_in_at: identity.logged_in_at,
            iat: issued,
            exp: issued + self.max_age.num_seconds(),
        };

        encode(&Header::default(), &claims, &self.encoding)
    }

    /// Decode a cookie value. Any failure (malformed, bad signature, expired,
    /// revoked) means "not logged in".
    pub async fn decode(&self, token: &str) -> Option<SessionIdentity> {
        if token.is_empty() {
            return None;
        }

        let claims = match decode::<SessionClaims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!("Session cookie rejected: {}", e);
                return None;
            }
        };

        if self.revoked.read().await.contains_key(&token_digest(token)) {
            tracing::debug!("Session cookie was revoked");
            return None;
        }

        Some(SessionIdentity {
            email: claims.email,
            is_admin: claims.is_admin,
            logged_in_at: claims.logged_in_at,
        })
    }

    /// Identity for the session cookie on `headers`, if any.
    pub async fn identity(&self, headers: &HeaderMap) -> Option<SessionIdentity> {
        let token = cookie_value(headers, SESSION_COOKIE_NAME)?;
        self.decode(token).await
    }

    pub async fn is_admin_session(&self, headers: &HeaderMap) -> bool {
        self.identity(headers)
            .await
            .map(|identity| identity.is_admin)
            .unwrap_or(false)
    }

    /// Refuse `token` from now until it would have expired anyway.
    pub async fn revoke(&self, token: &str) {
        let exp = match decode::<SessionClaims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => data.claims.exp,
            Err(_) => return,
        };

        let now = Utc::now().timestamp();
        let mut revoked = self.revoked.write().await;
        revoked.retain(|_, expires| *expires > now);
        revoked.insert(token_digest(token), exp);
    }

    /// `Set-Cookie` value carrying a fresh session token.
    pub fn session_cookie(&self, token: &str) -> HeaderValue {
        self.build_cookie(token, self.max_age.num_seconds())
    }

    /// `Set-Cookie` value deleting the session cookie.
    pub fn clear_cookie(&self) -> HeaderValue {
        self.build_cookie("", 0)
    }

    fn build_cookie(&self, value: &str, max_age: i64) -> HeaderValue {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE_NAME, value, max_age
        );
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        // JWTs are base64url plus dots, always a valid header value.
        HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
    }
}

/// Value of cookie `name` from the `Cookie` request headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}
