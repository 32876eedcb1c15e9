// ABOUTME: Image builder contract consumed by the lifecycle engine.
// ABOUTME: The default local builder trusts prebuilt images, loading archives.

use crate::config::FunctionConfig;
use crate::logstream::DeployLogger;
use crate::runtime::{ImageError, ImageOps};
use crate::types::ImageRef;
use async_trait::async_trait;
use std::sync::Arc;

/// Result of building a function image.
#[derive(Debug, Clone)]
pub struct BuiltImage {
    pub image: ImageRef,
}

/// Errors from image builds.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("function spec names no image and this builder cannot produce one")]
    MissingImage,

    #[error("failed to load image archive: {0}")]
    ArchiveLoad(#[from] ImageError),

    #[error("build failed: {0}")]
    Failed(String),
}

/// Produces a runnable image for a function.
///
/// Implementations are external collaborators; the engine only cares that a
/// usable image reference comes back.
#[async_trait]
pub trait ImageBuilder: Send + Sync {
    async fn build(
        &self,
        config: &FunctionConfig,
        logger: &DeployLogger,
    ) -> Result<BuiltImage, BuildError>;
}

/// Builder for functions shipped as prebuilt images.
///
/// Loads a local archive into the runtime when the spec names one, then
/// hands back the spec's image reference unchanged.
pub struct PrebuiltImageBuilder<R> {
    runtime: Arc<R>,
}

impl<R> PrebuiltImageBuilder<R> {
    pub fn new(runtime: Arc<R>) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl<R: ImageOps> ImageBuilder for PrebuiltImageBuilder<R> {
    async fn build(
        &self,
        config: &FunctionConfig,
        logger: &DeployLogger,
    ) -> Result<BuiltImage, BuildError> {
        if let Some(ref archive) = config.spec.build.image_archive {
            logger.info(format!("Loading image archive {}", archive.display()));
            self.runtime.load_image(archive).await?;
        }

        let image = config.spec.image.clone().ok_or(BuildError::MissingImage)?;
        logger.info(format!("Using image {}", image));
        Ok(BuiltImage { image })
    }
}
