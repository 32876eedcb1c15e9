// ABOUTME: Container operations trait for container runtimes.
// ABOUTME: Run, remove, inspect, list, and await health.

use super::sealed::Sealed;
use super::shared_types::{ContainerInfo, PortBindings, RunConfig};
use crate::types::ContainerId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Container lifecycle operations.
#[async_trait]
pub trait ContainerOps: Sealed + Send + Sync {
    /// Create and start a container from the given configuration.
    ///
    /// A container that was created but failed to start is removed before
    /// the error is returned.
    async fn run_container(&self, config: &RunConfig) -> Result<ContainerId, ContainerError>;

    /// Remove a container by ID or name.
    async fn remove_container(&self, id_or_name: &str, force: bool) -> Result<(), ContainerError>;

    /// Get detailed information about a container by ID or name.
    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError>;

    /// List containers matching the given filters.
    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError>;

    /// Wait until the container reports healthy, up to `timeout`.
    ///
    /// A running container whose image defines no healthcheck counts as
    /// healthy. An exited or unhealthy container fails immediately.
    async fn await_container_health(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<(), ContainerError>;
}

/// Filters for listing containers.
#[derive(Debug, Clone, Default)]
pub struct ContainerFilters {
    /// Filter by label (key=value).
    pub labels: HashMap<String, String>,
    /// Filter by name (supports partial match).
    pub name: Option<String>,
    /// Include stopped containers.
    pub stopped: bool,
}

impl ContainerFilters {
    /// Filter by exact container name.
    pub fn named(name: impl Into<String>, stopped: bool) -> Self {
        Self {
            name: Some(name.into()),
            stopped,
            ..Default::default()
        }
    }

    /// Filter by identity labels of a managed function.
    pub fn for_function(namespace: &str, function: &str, stopped: bool) -> Self {
        let mut labels = HashMap::new();
        labels.insert(
            crate::config::labels::PLATFORM.to_string(),
            crate::config::labels::PLATFORM_LOCAL.to_string(),
        );
        labels.insert(crate::config::labels::NAMESPACE.to_string(), namespace.to_string());
        labels.insert(
            crate::config::labels::FUNCTION_NAME.to_string(),
            function.to_string(),
        );
        Self {
            labels,
            name: None,
            stopped,
        }
    }
}

/// Summary information about a container, as returned by list.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    /// Raw state string as reported by the runtime.
    pub state: String,
    pub labels: HashMap<String, String>,
    pub port_bindings: PortBindings,
}

impl ContainerSummary {
    /// First host port bound for `<container_port>/tcp`.
    pub fn host_port(&self, container_port: u16) -> Option<u16> {
        super::shared_types::bound_host_port(&self.port_bindings, container_port)
    }
}

/// Errors from container operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("container not found: {0}")]
    NotFound(String),

    #[error("container already exists: {0}")]
    AlreadyExists(String),

    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("container is not healthy: {0}")]
    Unhealthy(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
