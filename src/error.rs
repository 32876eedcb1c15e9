// ABOUTME: Application-wide error types for the funcdock CLI.
// ABOUTME: Uses thiserror for ergonomic error handling with preserved rich types.

use std::path::PathBuf;
use thiserror::Error;

use crate::lifecycle::PlatformError;
use crate::runtime::DetectionError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("function config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("runtime detection failed: {0}")]
    RuntimeDetection(#[from] DetectionError),

    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

impl Error {
    /// Returns the platform error if this is a `Platform` variant.
    pub fn as_platform_error(&self) -> Option<&PlatformError> {
        match self {
            Error::Platform(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
