//! Input schemas shared by the REST handlers and the form actions.
//!
//! Every mutation is validated here exactly once per entry point; callers get
//! back either the normalized input or a field-keyed error map.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use url::Url;

lazy_static::lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9_-]+").unwrap();
    static ref REPEATED_HYPHENS: Regex = Regex::new(r"-{2,}").unwrap();
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9]([a-zA-Z0-9._%+-]*[a-zA-Z0-9])?@[a-zA-Z0-9]([a-zA-Z0-9.-]*[a-zA-Z0-9])?\.[a-zA-Z]{2,}$"
    )
    .unwrap();
}

/// Field name to list of messages, serialized as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors with a single `general` entry, for failures not tied to a field.
    pub fn general(message: impl Into<String>) -> Self {
        Self::single("general", message)
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(value)` when no error was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Turn a title into a URL-safe slug: lowercase, whitespace runs become `-`,
/// anything outside `[a-z0-9_-]` is dropped, hyphen runs collapse and edge
/// hyphens are trimmed.
pub fn slugify(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let hyphenated = WHITESPACE.replace_all(&lowered, "-");
    let cleaned = NON_SLUG_CHARS.replace_all(&hyphenated, "");
    let collapsed = REPEATED_HYPHENS.replace_all(&cleaned, "-");
    collapsed.trim_matches('-').to_string()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

fn is_http_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// `None` for absent or whitespace-only strings.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================================================
// Posts
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl PostInput {
    pub fn validate(self) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title_len = char_len(&self.title);
        if title_len < 3 {
            errors.add("title", "Title must be at least 3 characters long.");
        } else if title_len > 100 {
            errors.add("title", "Title cannot exceed 100 characters.");
        } else if slugify(&self.title).is_empty() {
            errors.add("title", "Title must contain at least one letter or number.");
        }

        if char_len(&self.content) < 10 {
            errors.add("content", "Content must be at least 10 characters long.");
        }

        let image_url = non_blank(self.image_url);
        if let Some(url) = &image_url {
            if !(url.starts_with("/uploads/") || is_http_url(url)) {
                errors.add("imageUrl", "Image URL must be an uploaded file or an http(s) URL.");
            }
        }

        errors.into_result(Self {
            title: self.title,
            content: self.content,
            image_url,
        })
    }
}

// ============================================================================
// Testimonials
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialInput {
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "whole_number_or_zero")]
    pub stars: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_hint: Option<String>,
}

/// Reads a JSON number with no fractional part. Anything else (strings,
/// fractions, `null`) becomes 0 so the range check reports it on the field.
fn whole_number_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_i64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|n| n.fract() == 0.0 && n.abs() <= i64::MAX as f64)
                .map(|n| n as i64)
        })
        .unwrap_or(0))
}

impl TestimonialInput {
    pub fn validate(self) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let quote_len = char_len(&self.quote);
        if quote_len < 10 {
            errors.add("quote", "Quote must be at least 10 characters.");
        } else if quote_len > 500 {
            errors.add("quote", "Quote cannot exceed 500 characters.");
        }

        let name_len = char_len(&self.name);
        if name_len < 1 {
            errors.add("name", "Name is required.");
        } else if name_len > 100 {
            errors.add("name", "Name cannot exceed 100 characters.");
        }

        if !(1..=5).contains(&self.stars) {
            errors.add("stars", "Stars must be between 1 and 5.");
        }

        let url = non_blank(self.url);
        if let Some(url) = &url {
            if !is_http_url(url) {
                errors.add("url", "Please enter a valid URL (e.g., https://example.com).");
            } else if char_len(url) > 200 {
                errors.add("url", "URL cannot exceed 200 characters.");
            }
        }

        let image_hint = non_blank(self.image_hint);
        if let Some(hint) = &image_hint {
            if char_len(hint) > 50 {
                errors.add("imageHint", "Image hint cannot exceed 50 characters.");
            }
        }

        errors.into_result(Self {
            quote: self.quote,
            name: self.name,
            stars: self.stars,
            url,
            image_hint,
        })
    }
}

// ============================================================================
// Settings
// ============================================================================

/// How an incoming settings update treats the stored SMTP password.
///
/// On the wire: an absent field or `""` is `Unchanged`, `null` is `Clear`,
/// any other string is `SetTo`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SecretUpdate {
    #[default]
    Unchanged,
    Clear,
    SetTo(String),
}

impl<'de> Deserialize<'de> for SecretUpdate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<String>::deserialize(deserializer)? {
            None => SecretUpdate::Clear,
            Some(value) if value.is_empty() => SecretUpdate::Unchanged,
            Some(value) => SecretUpdate::SetTo(value),
        })
    }
}

impl SecretUpdate {
    /// Resolve against the currently stored secret.
    pub fn apply(self, current: String) -> String {
        match self {
            SecretUpdate::Unchanged => current,
            SecretUpdate::Clear => String::new(),
            SecretUpdate::SetTo(value) => value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinksUpdate {
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
}

impl SocialLinksUpdate {
    fn check(&self, prefix: &str, errors: &mut FieldErrors) {
        for (field, label, value) in [
            ("linkedin", "LinkedIn", &self.linkedin),
            ("instagram", "Instagram", &self.instagram),
            ("facebook", "Facebook", &self.facebook),
        ] {
            if let Some(value) = value {
                if !value.is_empty() && !is_http_url(value) {
                    errors.add(format!("{prefix}{field}"), format!("Invalid {label} URL"));
                }
            }
        }
    }

    pub fn validate(self) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        self.check("", &mut errors);
        errors.into_result(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpSettingsUpdate {
    pub host: Option<String>,
    pub port: Option<i64>,
    pub user: Option<String>,
    #[serde(default)]
    pub pass: SecretUpdate,
    pub secure: Option<bool>,
    pub from_email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub social_links: Option<SocialLinksUpdate>,
    pub smtp_settings: Option<SmtpSettingsUpdate>,
}

impl SettingsUpdate {
    pub fn validate(self) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        if let Some(social) = &self.social_links {
            social.check("socialLinks.", &mut errors);
        }

        if let Some(smtp) = &self.smtp_settings {
            if let Some(port) = smtp.port {
                if !(1..=i64::from(u16::MAX)).contains(&port) {
                    errors.add("smtpSettings.port", "Port must be a positive integer.");
                }
            }
            if let Some(from) = &smtp.from_email {
                if !from.is_empty() && !is_valid_email(from) {
                    errors.add("smtpSettings.fromEmail", "Invalid 'From Email' address.");
                }
            }
        }

        errors.into_result(self)
    }
}

// ============================================================================
// Contact form
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContactInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

impl ContactInput {
    pub fn validate(self) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name_len = char_len(&self.name);
        if name_len < 1 {
            errors.add("name", "Name is required.");
        } else if name_len > 100 {
            errors.add("name", "Name cannot exceed 100 characters.");
        }

        if !is_valid_email(&self.email) {
            errors.add("email", "Invalid email address.");
        } else if char_len(&self.email) > 100 {
            errors.add("email", "Email cannot exceed 100 characters.");
        }

        let message_len = char_len(&self.message);
        if message_len < 10 {
            errors.add("message", "Message must be at least 10 characters.");
        } else if message_len > 1000 {
            errors.add("message", "Message cannot exceed 1000 characters.");
        }

        errors.into_result(self)
    }
}
