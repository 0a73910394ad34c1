//! Blog image storage: validated writes under the public upload directory,
//! best-effort deletes.

use async_trait::async_trait;
use chrono::Utc;
use rand::distr::{Alphanumeric, SampleString};
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

use crate::validation::slugify;

/// Public URL prefix uploaded images are served under.
pub const PUBLIC_PREFIX: &str = "/uploads/blog";
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024; // 5MB
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Empty file")]
    Empty,
    #[error("File too large. Maximum size is 5MB.")]
    TooLarge,
    #[error("Unsupported file type. Allowed: JPEG, PNG, WebP, GIF.")]
    UnsupportedType,
    #[error("File content does not match an allowed image type.")]
    ContentMismatch,
    #[error("Failed to save file")]
    Io(#[from] std::io::Error),
}

/// Where uploaded post images live.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Validate and persist an image, returning its public URL.
    async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, UploadError>;

    /// Remove the file behind a public URL. URLs outside the upload prefix
    /// are ignored, a missing file is not an error, other failures are logged.
    async fn delete(&self, url: &str);
}

fn validate_image_magic_bytes(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 4 {
        return None;
    }
    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        // GIF: 47 49 46 38
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        // WebP: 52 49 46 46 ... 57 45 42 50
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains("..")
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.contains('\0')
}

/// `<slugified-stem>-<timestamp-ms>-<random>.<ext>`
pub fn generate_filename(original_name: &str, ext: &str) -> String {
    let stem = original_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(original_name);
    let mut base = slugify(stem);
    if base.is_empty() {
        base = "image".to_string();
    }
    base.truncate(60);

    let suffix = Alphanumeric
        .sample_string(&mut rand::rng(), 8)
        .to_lowercase();
    format!("{}-{}-{}.{}", base, Utc::now().timestamp_millis(), suffix, ext)
}

/// Check size, extension and content; returns the detected MIME type.
pub fn validate_image(original_name: &str, bytes: &[u8]) -> Result<&'static str, UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }
    if bytes.len() > MAX_FILE_SIZE {
        return Err(UploadError::TooLarge);
    }

    let ext = original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(UploadError::UnsupportedType);
    }

    validate_image_magic_bytes(bytes).ok_or(UploadError::ContentMismatch)
}

/// Images on the local filesystem, served statically under [`PUBLIC_PREFIX`].
#[derive(Debug, Clone)]
pub struct DiskImageStore {
    dir: PathBuf,
}

impl DiskImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Filesystem path for a public URL, if it points into the upload dir.
    fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let filename = url.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?;
        is_safe_filename(filename).then(|| self.dir.join(filename))
    }
}

#[async_trait]
impl ImageStore for DiskImageStore {
    async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let mime_type = validate_image(original_name, bytes)?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            tracing::error!("Failed to create upload directory: {}", e);
            e
        })?;

        let filename = generate_filename(original_name, extension_for_mime(mime_type));
        let file_path = self.dir.join(&filename);

        tokio::fs::write(&file_path, bytes).await.map_err(|e| {
            tracing::error!("Failed to write upload file {}: {}", filename, e);
            e
        })?;

        tracing::info!("Image uploaded: {} ({} bytes)", filename, bytes.len());
        Ok(format!("{}/{}", PUBLIC_PREFIX, filename))
    }

    async fn delete(&self, url: &str) {
        let Some(path) = self.path_for_url(url) else {
            tracing::debug!("Not an uploaded image, skipping delete: {}", url);
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::info!("Image deleted: {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Image already gone: {}", path.display());
            }
            Err(e) => tracing::error!("Failed to delete image {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    /// Disk store whose writes always fail. Deletes still reach the disk.
    pub(crate) struct FailingImageStore(pub(crate) DiskImageStore);

    #[async_trait]
    impl ImageStore for FailingImageStore {
        async fn save(&self, _original_name: &str, _bytes: &[u8]) -> Result<String, UploadError> {
            Err(UploadError::Io(std::io::Error::new(ErrorKind::Other, "disk full")))
        }

        async fn delete(&self, url: &str) {
            self.0.delete(url).await
        }
    }

    #[test]
    fn test_magic_bytes_detection() {
        assert_eq!(validate_image_magic_bytes(PNG_BYTES), Some("image/png"));
        assert_eq!(validate_image_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(validate_image_magic_bytes(b"GIF89a"), Some("image/gif"));
        assert_eq!(validate_image_magic_bytes(b"hello world"), None);
        assert_eq!(validate_image_magic_bytes(&[0xFF]), None);
    }

    #[test]
    fn test_validate_image_rejections() {
        assert!(matches!(validate_image("a.png", &[]), Err(UploadError::Empty)));
        assert!(matches!(
            validate_image("a.exe", PNG_BYTES),
            Err(UploadError::UnsupportedType)
        ));
        assert!(matches!(
            validate_image("a.png", b"plain text!"),
            Err(UploadError::ContentMismatch)
        ));
        let huge = vec![0u8; MAX_FILE_SIZE + 1];
        assert!(matches!(validate_image("a.png", &huge), Err(UploadError::TooLarge)));
    }

    #[test]
    fn test_generated_filenames_are_unique_and_slugged() {
        let a = generate_filename("My Holiday Photo.PNG", "png");
        let b = generate_filename("My Holiday Photo.PNG", "png");
        assert!(a.starts_with("my-holiday-photo-"));
        assert!(a.ends_with(".png"));
        assert_ne!(a, b);
        assert!(generate_filename("???.jpg", "jpg").starts_with("image-"));
    }

    #[tokio::test]
    async fn test_save_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskImageStore::new(dir.path().join("blog"));

        let url = store.save("cover.png", PNG_BYTES).await.unwrap();
        assert!(url.starts_with("/uploads/blog/cover-"));
        let path = store.path_for_url(&url).unwrap();
        assert!(path.exists());

        store.delete(&url).await;
        assert!(!path.exists());
        // Second delete hits NotFound and is swallowed.
        store.delete(&url).await;
    }

    #[tokio::test]
    async fn test_delete_ignores_foreign_and_traversal_urls() {
        let dir = tempfile::tempdir().unwrap();
        let keep = dir.path().join("keep.txt");
        std::fs::write(&keep, b"x").unwrap();
        let store = DiskImageStore::new(dir.path().join("blog"));

        store.delete("https://picsum.photos/seed/a/1200/600").await;
        store.delete("/uploads/blog/../keep.txt").await;
        assert!(keep.exists());
    }

    #[tokio::test]
    async fn test_save_fails_when_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blog");
        std::fs::write(&blocker, b"not a dir").unwrap();
        let store = DiskImageStore::new(&blocker);
        assert!(matches!(
            store.save("cover.png", PNG_BYTES).await,
            Err(UploadError::Io(_))
        ));
    }
}
