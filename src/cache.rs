//! Revalidation registry for rendered pages.
//!
//! Mutations mark the page paths whose content they changed; a renderer in
//! front of this service compares the recorded time against its own cached
//! copy and re-renders when the page is stale.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct PageCache {
    revalidated: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn revalidate(&self, path: &str) {
        let now = Utc::now();
        self.revalidated.write().await.insert(path.to_string(), now);
        tracing::debug!(path = %path, "page revalidated");
    }

    pub async fn revalidate_all<S: AsRef<str>>(&self, paths: &[S]) {
        let now = Utc::now();
        let mut revalidated = self.revalidated.write().await;
        for path in paths {
            revalidated.insert(path.as_ref().to_string(), now);
        }
        tracing::debug!(count = paths.len(), "pages revalidated");
    }

    pub async fn last_revalidated(&self, path: &str) -> Option<DateTime<Utc>> {
        self.revalidated.read().await.get(path).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_path_has_no_revalidation() {
        let cache = PageCache::new();
        assert!(cache.last_revalidated("/blog").await.is_none());
    }

    #[tokio::test]
    async fn test_revalidate_records_time() {
        let cache = PageCache::new();
        let before = Utc::now();
        cache.revalidate_all(&["/blog", "/blog/foo"]).await;
        assert!(cache.last_revalidated("/blog").await.unwrap() >= before);
        assert!(cache.last_revalidated("/blog/foo").await.is_some());
        assert!(cache.last_revalidated("/testimonials").await.is_none());
    }

    #[tokio::test]
    async fn test_revalidate_moves_time_forward() {
        let cache = PageCache::new();
        cache.revalidate("/blog").await;
        let first = cache.last_revalidated("/blog").await.unwrap();
        cache.revalidate("/blog").await;
        assert!(cache.last_revalidated("/blog").await.unwrap() >= first);
    }
}
