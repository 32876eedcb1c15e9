// ABOUTME: Log collection trait for container runtimes.
// ABOUTME: Collected output is attached to failure messages, best effort.

use super::sealed::Sealed;
use crate::types::ContainerId;
use async_trait::async_trait;

/// Collected container log access.
#[async_trait]
pub trait LogOps: Sealed + Send + Sync {
    /// Collect the container's current stdout+stderr output.
    async fn container_logs(&self, id: &ContainerId) -> Result<String, LogError>;
}

/// Errors from log collection.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("container not found: {0}")]
    NotFound(String),

    #[error("log stream error: {0}")]
    StreamError(String),
}
