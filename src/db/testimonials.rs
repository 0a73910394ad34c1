use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    generate_id, models::Testimonial, seed_timestamp, StoreResult, TestimonialRepository,
};
use crate::validation::TestimonialInput;

#[derive(Default)]
pub struct InMemoryTestimonialStore {
    testimonials: RwLock<Vec<Testimonial>>,
}

/// Validated input guarantees 1..=5; the clamp keeps the cast lossless.
fn stars(input: &TestimonialInput) -> u8 {
    input.stars.clamp(1, 5) as u8
}

impl InMemoryTestimonialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_testimonials(testimonials: Vec<Testimonial>) -> Self {
        Self {
            testimonials: RwLock::new(testimonials),
        }
    }

    pub fn seeded() -> Self {
        Self::with_testimonials(seed_testimonials())
    }
}

#[async_trait]
impl TestimonialRepository for InMemoryTestimonialStore {
    async fn list(&self) -> StoreResult<Vec<Testimonial>> {
        let mut testimonials = self.testimonials.read().await.clone();
        testimonials.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(testimonials)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Testimonial>> {
        let testimonials = self.testimonials.read().await;
        let found = testimonials.iter().find(|t| t.id == id).cloned();
        tracing::debug!(id = %id, found = found.is_some(), "testimonial lookup");
        Ok(found)
    }

    async fn create(&self, input: TestimonialInput) -> StoreResult<Testimonial> {
        let now = Utc::now();
        let testimonial = Testimonial {
            id: generate_id(),
            stars: stars(&input),
            quote: input.quote,
            name: input.name,
            url: input.url,
            image_hint: input.image_hint,
            created_at: now,
            updated_at: now,
        };

        let mut testimonials = self.testimonials.write().await;
        testimonials.push(testimonial.clone());
        tracing::info!(id = %testimonial.id, total = testimonials.len(), "testimonial created");
        Ok(testimonial)
    }

    async fn update(&self, id: &str, input: TestimonialInput) -> StoreResult<Option<Testimonial>> {
        let mut testimonials = self.testimonials.write().await;
        let Some(existing) = testimonials.iter_mut().find(|t| t.id == id) else {
            tracing::warn!(id = %id, "update failed: testimonial not found");
            return Ok(None);
        };

        existing.stars = stars(&input);
        existing.quote = input.quote;
        existing.name = input.name;
        existing.url = input.url;
        existing.image_hint = input.image_hint;
        existing.updated_at = Utc::now();

        tracing::info!(id = %id, "testimonial updated");
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let mut testimonials = self.testimonials.write().await;
        let before = testimonials.len();
        testimonials.retain(|t| t.id != id);
        let deleted = testimonials.len() < before;
        if deleted {
            tracing::info!(id = %id, "testimonial deleted");
        }
        Ok(deleted)
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.testimonials.read().await.len())
    }
}

fn seed_testimonials() -> Vec<Testimonial> {
    let seed = |id: &str, quote: &str, name: &str, stars: u8, url: Option<&str>, at: &str| {
        let created = seed_timestamp(at);
        Testimonial {
            id: id.to_string(),
            quote: quote.to_string(),
            name: name.to_string(),
            stars,
            url: url.map(str::to_string),
            image_hint: None,
            created_at: created,
            updated_at: created,
        }
    };

    vec![
        seed(
            "t1",
            "Slate & Chalk MindCare transformed my perspective on life. Their compassionate approach made all the difference.",
            "A. N.",
            5,
            Some("https://example.com/an-story"),
            "2023-12-01T10:00:00Z",
        ),
        seed(
            "t2",
            "I felt truly heard and understood. The therapists are incredibly skilled and supportive. Highly recommend!",
            "J. B.",
            5,
            None,
            "2023-12-10T11:30:00Z",
        ),
        seed(
            "t3",
            "The couples counseling sessions helped us rebuild our communication and strengthen our bond. We are so grateful.",
            "M. & K. S.",
            5,
            Some("https://example.com/mks-journey"),
            "2024-01-05T09:15:00Z",
        ),
        seed(
            "t4",
            "A safe and professional environment. I've learned so much about myself and developed effective coping strategies.",
            "L. P.",
            4,
            None,
            "2024-01-20T16:00:00Z",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(quote: &str, stars: i64) -> TestimonialInput {
        TestimonialInput {
            quote: quote.to_string(),
            name: "R. T.".to_string(),
            stars,
            url: None,
            image_hint: Some("smiling person".to_string()),
        }
    }

    #[tokio::test]
    async fn test_seeded_list_is_newest_first() {
        let store = InMemoryTestimonialStore::seeded();
        let ids: Vec<_> = store.list().await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["t4", "t3", "t2", "t1"]);
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = InMemoryTestimonialStore::new();
        let created = store.create(input("Kind and very patient.", 4)).await.unwrap();
        let fetched = store.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.stars, 4);
        assert_eq!(fetched.image_hint.as_deref(), Some("smiling person"));
    }

    #[tokio::test]
    async fn test_update_replaces_fields_and_keeps_created_at() {
        let store = InMemoryTestimonialStore::seeded();
        let before = store.get("t2").await.unwrap().unwrap();
        let updated = store
            .update("t2", input("Changed my life for the better.", 3))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.quote, "Changed my life for the better.");
        assert_eq!(updated.stars, 3);
        assert_eq!(updated.created_at, before.created_at);
        assert!(updated.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_none() {
        let store = InMemoryTestimonialStore::new();
        assert!(store.update("missing", input("Some quote here", 5)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let store = InMemoryTestimonialStore::seeded();
        assert!(store.delete("t1").await.unwrap());
        assert!(!store.delete("t1").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 3);
    }
}
