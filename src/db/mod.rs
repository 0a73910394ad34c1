//! Content stores.
//!
//! Handlers only see the repository traits below; the in-memory
//! implementations keep everything for the lifetime of the process.

pub mod models;
pub mod posts;
pub mod settings;
pub mod testimonials;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::validation::{PostInput, SettingsUpdate, SocialLinksUpdate, TestimonialInput};
use models::{AppSettings, Post, SocialLinks, Testimonial};

pub use posts::InMemoryPostStore;
pub use settings::InMemorySettingsStore;
pub use testimonials::InMemoryTestimonialStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// All posts, newest first.
    async fn list(&self) -> StoreResult<Vec<Post>>;
    async fn get(&self, slug: &str) -> StoreResult<Option<Post>>;
    async fn create(&self, input: PostInput) -> StoreResult<Post>;
    /// `None` when no post has `slug`.
    async fn update(&self, slug: &str, input: PostInput) -> StoreResult<Option<Post>>;
    /// Whether a post was removed.
    async fn delete(&self, slug: &str) -> StoreResult<bool>;
    async fn count(&self) -> StoreResult<usize>;
}

#[async_trait]
pub trait TestimonialRepository: Send + Sync {
    /// All testimonials, newest first.
    async fn list(&self) -> StoreResult<Vec<Testimonial>>;
    async fn get(&self, id: &str) -> StoreResult<Option<Testimonial>>;
    async fn create(&self, input: TestimonialInput) -> StoreResult<Testimonial>;
    async fn update(&self, id: &str, input: TestimonialInput) -> StoreResult<Option<Testimonial>>;
    async fn delete(&self, id: &str) -> StoreResult<bool>;
    async fn count(&self) -> StoreResult<usize>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get(&self) -> StoreResult<AppSettings>;
    /// Merge the fields present in `update` and return the result.
    async fn update(&self, update: SettingsUpdate) -> StoreResult<AppSettings>;
    async fn update_social(&self, update: SocialLinksUpdate) -> StoreResult<SocialLinks>;
}

/// Opaque record id: time-ordered with a random tail.
pub fn generate_id() -> String {
    Uuid::now_v7().simple().to_string()
}

/// Fixed timestamp for seed records; falls back to now if `rfc3339` is malformed.
pub(crate) fn seed_timestamp(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_distinct() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_seed_timestamp_parses_utc() {
        assert_eq!(seed_timestamp("2023-12-01T10:00:00Z").timestamp(), 1_701_424_800);
    }
}
