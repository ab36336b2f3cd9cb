//! Image hosting port for product photos. The only adapter is a local
//! media directory served back under `/media`; the trait keeps the upload
//! flow testable without touching the filesystem.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("upload failed: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Stores the image bytes and returns the hosted URL.
    async fn store(&self, content_type: &str, bytes: Vec<u8>) -> Result<String, UploadError>;
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Writes uploads into a local directory with generated names; the
/// directory is exposed over HTTP at `/media`.
pub struct LocalMediaHost {
    dir: PathBuf,
    /// Prefix for returned URLs; empty yields relative `/media/...` URLs.
    base_url: String,
}

impl LocalMediaHost {
    pub fn new(dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ImageHost for LocalMediaHost {
    async fn store(&self, content_type: &str, bytes: Vec<u8>) -> Result<String, UploadError> {
        let ext = extension_for(content_type)
            .ok_or_else(|| UploadError::UnsupportedType(content_type.to_string()))?;
        let name = format!("{}.{ext}", Uuid::new_v4());
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&name), bytes).await?;
        tracing::debug!(file = %name, "stored uploaded image");
        Ok(format!("{}/media/{name}", self.base_url))
    }
}
