use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{generate_id, models::Post, seed_timestamp, PostRepository, StoreResult};
use crate::uploads::ImageStore;
use crate::validation::{slugify, PostInput};

/// Posts held in process memory. Deleting a post also removes its uploaded
/// image through the image store.
pub struct InMemoryPostStore {
    posts: RwLock<Vec<Post>>,
    images: Arc<dyn ImageStore>,
}

/// First of `base`, `base-1`, `base-2`, ... not used by a post other than `exclude_id`.
fn unique_slug(posts: &[Post], title: &str, exclude_id: Option<&str>) -> String {
    let base = slugify(title);
    let taken = |candidate: &str| {
        posts
            .iter()
            .any(|p| p.slug == candidate && Some(p.id.as_str()) != exclude_id)
    };

    let mut candidate = base.clone();
    let mut counter = 1;
    while taken(&candidate) {
        candidate = format!("{}-{}", base, counter);
        counter += 1;
    }
    candidate
}

impl InMemoryPostStore {
    pub fn new(images: Arc<dyn ImageStore>) -> Self {
        Self::with_posts(images, Vec::new())
    }

    pub fn with_posts(images: Arc<dyn ImageStore>, posts: Vec<Post>) -> Self {
        Self {
            posts: RwLock::new(posts),
            images,
        }
    }

    /// Store pre-filled with the starter articles.
    pub fn seeded(images: Arc<dyn ImageStore>) -> Self {
        Self::with_posts(images, seed_posts())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostStore {
    async fn list(&self) -> StoreResult<Vec<Post>> {
        let mut posts = self.posts.read().await.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tracing::debug!(count = posts.len(), "listing posts");
        Ok(posts)
    }

    async fn get(&self, slug: &str) -> StoreResult<Option<Post>> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| p.slug == slug).cloned())
    }

    async fn create(&self, input: PostInput) -> StoreResult<Post> {
        let mut posts = self.posts.write().await;
        let now = Utc::now();
        let post = Post {
            id: generate_id(),
            slug: unique_slug(&posts, &input.title, None),
            title: input.title,
            content: input.content,
            image_url: input.image_url,
            created_at: now,
            updated_at: now,
        };
        posts.push(post.clone());

        tracing::info!(slug = %post.slug, id = %post.id, total = posts.len(), "post created");
        Ok(post)
    }

    async fn update(&self, slug: &str, input: PostInput) -> StoreResult<Option<Post>> {
        let mut posts = self.posts.write().await;
        let Some(index) = posts.iter().position(|p| p.slug == slug) else {
            tracing::warn!(slug = %slug, "update failed: post not found");
            return Ok(None);
        };

        let original = &posts[index];
        let new_slug = if original.title != input.title {
            unique_slug(&posts, &input.title, Some(&original.id))
        } else {
            original.slug.clone()
        };

        let updated = Post {
            slug: new_slug,
            title: input.title,
            content: input.content,
            image_url: input.image_url,
            updated_at: Utc::now(),
            ..original.clone()
        };
        posts[index] = updated.clone();

        tracing::info!(old_slug = %slug, new_slug = %updated.slug, id = %updated.id, "post updated");
        Ok(Some(updated))
    }

    async fn delete(&self, slug: &str) -> StoreResult<bool> {
        let removed = {
            let mut posts = self.posts.write().await;
            match posts.iter().position(|p| p.slug == slug) {
                Some(index) => posts.remove(index),
                None => {
                    tracing::debug!(slug = %slug, "delete of unknown post");
                    return Ok(false);
                }
            }
        };

        if let Some(url) = &removed.image_url {
            self.images.delete(url).await;
        }

        tracing::info!(slug = %slug, id = %removed.id, "post deleted");
        Ok(true)
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.posts.read().await.len())
    }
}

fn seed_posts() -> Vec<Post> {
    let seed = |id: &str, slug: &str, title: &str, content: &str, created: DateTime<Utc>| Post {
        id: id.to_string(),
        slug: slug.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        image_url: Some(format!("https://picsum.photos/seed/{}/1200/600", slug)),
        created_at: created,
        updated_at: created,
    };

    vec![
        seed(
            "1",
            "understanding-anxiety",
            "Understanding Anxiety and How to Cope",
            "Anxiety is a common human experience, but it can become overwhelming. This post explores \
             the nature of anxiety, its common triggers, and effective coping strategies. We discuss \
             mindfulness techniques, cognitive restructuring, and when to seek professional help.",
            seed_timestamp("2023-10-15T10:00:00Z"),
        ),
        seed(
            "2",
            "the-importance-of-self-care",
            "The Importance of Self-Care in Mental Health",
            "Self-care is not selfish; it is essential for maintaining good mental health. This article \
             looks at physical well-being like sleep and nutrition, and at emotional practices like \
             setting boundaries and making time for hobbies.",
            seed_timestamp("2023-11-02T14:30:00Z"),
        ),
        seed(
            "3",
            "building-healthy-relationships",
            "Building Healthy Relationships: Communication and Boundaries",
            "Healthy relationships are a cornerstone of a happy life. This post focuses on effective \
             communication and healthy boundaries: active listening, expressing needs respectfully, \
             and mutual respect in romantic, familial and platonic relationships.",
            seed_timestamp("2023-11-20T09:15:00Z"),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uploads::{tests::PNG_BYTES, DiskImageStore};

    fn input(title: &str) -> PostInput {
        PostInput {
            title: title.to_string(),
            content: "Some thoughtful content.".to_string(),
            image_url: None,
        }
    }

    fn store() -> InMemoryPostStore {
        InMemoryPostStore::new(Arc::new(DiskImageStore::new("unused-upload-dir")))
    }

    #[tokio::test]
    async fn test_colliding_titles_get_suffixed_slugs() {
        let store = store();
        let first = store.create(input("Hello World")).await.unwrap();
        let second = store.create(input("Hello, World!")).await.unwrap();
        let third = store.create(input("hello   world")).await.unwrap();
        assert_eq!(first.slug, "hello-world");
        assert_eq!(second.slug, "hello-world-1");
        assert_eq!(third.slug, "hello-world-2");
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let store = store();
        let mut data = input("Finding Calm");
        data.image_url = Some("/uploads/blog/calm.png".to_string());
        let created = store.create(data.clone()).await.unwrap();
        let fetched = store.get(&created.slug).await.unwrap().unwrap();
        assert_eq!(fetched.title, data.title);
        assert_eq!(fetched.content, data.content);
        assert_eq!(fetched.image_url, data.image_url);
        assert_eq!(fetched.created_at, fetched.updated_at);
    }

    #[tokio::test]
    async fn test_update_same_title_keeps_slug_and_bumps_updated_at() {
        let store = store();
        let created = store.create(input("Foo")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let updated = store.update("foo", input("Foo")).await.unwrap().unwrap();
        assert_eq!(updated.slug, "foo");
        assert_eq!(updated.id, created.id);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_title_change_avoids_other_posts_slug() {
        let store = store();
        store.create(input("Taken")).await.unwrap();
        store.create(input("Other")).await.unwrap();
        let updated = store.update("other", input("Taken")).await.unwrap().unwrap();
        assert_eq!(updated.slug, "taken-1");
        assert!(store.get("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_title_with_same_slug_keeps_own_slug() {
        let store = store();
        store.create(input("Foo Bar")).await.unwrap();
        let updated = store.update("foo-bar", input("Foo  Bar!")).await.unwrap().unwrap();
        assert_eq!(updated.slug, "foo-bar");
    }

    #[tokio::test]
    async fn test_update_unknown_slug_is_none() {
        assert!(store().update("nope", input("Whatever")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_twice_reports_not_found() {
        let store = store();
        store.create(input("Short Lived")).await.unwrap();
        assert!(store.delete("short-lived").await.unwrap());
        assert!(!store.delete("short-lived").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_uploaded_image() {
        let dir = tempfile::tempdir().unwrap();
        let images = Arc::new(DiskImageStore::new(dir.path()));
        let url = images.save("cover.png", PNG_BYTES).await.unwrap();
        let filename = url.rsplit('/').next().unwrap().to_string();

        let store = InMemoryPostStore::new(images);
        let mut data = input("With Image");
        data.image_url = Some(url);
        store.create(data).await.unwrap();

        assert!(dir.path().join(&filename).exists());
        assert!(store.delete("with-image").await.unwrap());
        assert!(!dir.path().join(&filename).exists());
    }

    #[tokio::test]
    async fn test_delete_with_missing_image_file_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let store = InMemoryPostStore::new(Arc::new(DiskImageStore::new(dir.path())));
        let mut data = input("Ghost Image");
        data.image_url = Some("/uploads/blog/already-gone.png".to_string());
        store.create(data).await.unwrap();
        assert!(store.delete("ghost-image").await.unwrap());
    }

    #[tokio::test]
    async fn test_seeded_list_is_newest_first() {
        let store = InMemoryPostStore::seeded(Arc::new(DiskImageStore::new("unused")));
        let slugs: Vec<_> = store.list().await.unwrap().into_iter().map(|p| p.slug).collect();
        assert_eq!(
            slugs,
            vec![
                "building-healthy-relationships",
                "the-importance-of-self-care",
                "understanding-anxiety"
            ]
        );
    }
}
