//! Content models as stored and as sent over the wire (camelCase JSON).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client testimonial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: String,
    pub quote: String,
    pub name: String,
    pub stars: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_hint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub linkedin: String,
    pub instagram: String,
    pub facebook: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub secure: bool,
    pub from_email: String,
}

/// Site-wide settings singleton
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub social_links: SocialLinks,
    pub smtp_settings: SmtpSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            social_links: SocialLinks {
                linkedin: "https://www.linkedin.com/in/example".to_string(),
                instagram: "https://www.instagram.com/example".to_string(),
                facebook: "https://www.facebook.com/example".to_string(),
            },
            smtp_settings: SmtpSettings {
                host: String::new(),
                port: 587,
                user: String::new(),
                pass: String::new(),
                secure: true,
                from_email: "noreply@example.com".to_string(),
            },
        }
    }
}
