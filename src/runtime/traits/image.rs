// ABOUTME: Image operations trait for container runtimes.
// ABOUTME: Archive loading and existence checks; pulls are the builder's job.

use super::sealed::Sealed;
use crate::types::ImageRef;
use async_trait::async_trait;
use std::path::Path;

/// Image operations needed by the local backend.
#[async_trait]
pub trait ImageOps: Sealed + Send + Sync {
    /// Load an image tar archive into the runtime.
    async fn load_image(&self, archive_path: &Path) -> Result<(), ImageError>;

    /// Check whether an image is present locally.
    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError>;
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("failed to load image archive: {0}")]
    LoadFailed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
