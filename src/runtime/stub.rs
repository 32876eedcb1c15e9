// ABOUTME: In-memory stub runtime for development and tests.
// ABOUTME: Scriptable container states, no daemon required.

use crate::runtime::traits::sealed::Sealed;
use crate::runtime::traits::{
    ContainerError, ContainerFilters, ContainerInfo, ContainerOps, ContainerState,
    ContainerSummary, HealthState, ImageError, ImageOps, LogError, LogOps, PortBinding,
    PortBindings, RunConfig,
};
use crate::types::{ContainerId, ImageRef};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// A container tracked by the stub runtime.
#[derive(Debug, Clone)]
pub struct StubContainer {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    pub labels: HashMap<String, String>,
    pub port_bindings: PortBindings,
    pub state: ContainerState,
    pub health: HealthState,
}

#[derive(Default)]
struct StubState {
    containers: Vec<StubContainer>,
    health_overrides: HashMap<String, HealthState>,
    logs: HashMap<String, String>,
    loaded_archives: Vec<PathBuf>,
    next_id: u64,
}

/// Container runtime that keeps everything in memory.
///
/// Containers "run" as records; health outcomes are scripted per container
/// name ahead of time via [`StubRuntime::set_health`]. Useful on machines
/// without a container daemon and in the test suite.
#[derive(Clone, Default)]
pub struct StubRuntime {
    state: Arc<Mutex<StubState>>,
}

impl StubRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the health outcome for containers with the given name.
    ///
    /// Applies to containers already running and to ones started later.
    pub fn set_health(&self, name: &str, health: HealthState) {
        let mut state = self.state.lock();
        state.health_overrides.insert(name.to_string(), health);
        for c in state.containers.iter_mut().filter(|c| c.name == name) {
            c.health = health;
        }
    }

    /// Simulate an externally killed container.
    pub fn kill(&self, name: &str) {
        let mut state = self.state.lock();
        for c in state.containers.iter_mut().filter(|c| c.name == name) {
            c.state = ContainerState::Exited;
        }
    }

    /// Simulate an externally restarted container.
    pub fn revive(&self, name: &str) {
        let mut state = self.state.lock();
        for c in state.containers.iter_mut().filter(|c| c.name == name) {
            c.state = ContainerState::Running;
            c.health = HealthState::Healthy;
        }
    }

    /// Set the log text returned for containers with the given name.
    pub fn set_logs(&self, name: &str, text: &str) {
        self.state.lock().logs.insert(name.to_string(), text.to_string());
    }

    /// Snapshot of all tracked containers.
    pub fn containers(&self) -> Vec<StubContainer> {
        self.state.lock().containers.clone()
    }

    /// Archives handed to `load_image` so far.
    pub fn loaded_archives(&self) -> Vec<PathBuf> {
        self.state.lock().loaded_archives.clone()
    }

    fn find(&self, id_or_name: &str) -> Option<StubContainer> {
        self.state
            .lock()
            .containers
            .iter()
            .find(|c| c.id.as_str() == id_or_name || c.name == id_or_name)
            .cloned()
    }
}

impl Sealed for StubRuntime {}

#[async_trait]
impl ContainerOps for StubRuntime {
    async fn run_container(&self, config: &RunConfig) -> Result<ContainerId, ContainerError> {
        let mut state = self.state.lock();

        if state.containers.iter().any(|c| c.name == config.name) {
            return Err(ContainerError::AlreadyExists(config.name.clone()));
        }

        state.next_id += 1;
        let id = ContainerId::new(format!("stub-{}", state.next_id));

        let mut port_bindings: PortBindings = HashMap::new();
        for port in &config.ports {
            port_bindings.insert(
                format!("{}/tcp", port.container_port),
                vec![PortBinding {
                    host_ip: None,
                    host_port: Some(port.host_port),
                }],
            );
        }

        let health = state
            .health_overrides
            .get(&config.name)
            .copied()
            .unwrap_or(HealthState::Healthy);

        state.containers.push(StubContainer {
            id: id.clone(),
            name: config.name.clone(),
            image: config.image.to_string(),
            labels: config.labels.clone(),
            port_bindings,
            state: ContainerState::Running,
            health,
        });

        Ok(id)
    }

    async fn remove_container(&self, id_or_name: &str, _force: bool) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        let before = state.containers.len();
        state
            .containers
            .retain(|c| c.id.as_str() != id_or_name && c.name != id_or_name);
        if state.containers.len() == before {
            return Err(ContainerError::NotFound(id_or_name.to_string()));
        }
        Ok(())
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let container = self
            .find(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;

        Ok(ContainerInfo {
            id: container.id.clone(),
            name: container.name.clone(),
            image: container.image.clone(),
            state: container.state,
            health: Some(container.health),
            labels: container.labels.clone(),
            port_bindings: container.port_bindings.clone(),
        })
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let state = self.state.lock();

        Ok(state
            .containers
            .iter()
            .filter(|c| {
                if let Some(ref name) = filters.name
                    && !c.name.contains(name.as_str())
                {
                    return false;
                }
                if !filters.stopped && c.state != ContainerState::Running {
                    return false;
                }
                filters
                    .labels
                    .iter()
                    .all(|(k, v)| c.labels.get(k) == Some(v))
            })
            .map(|c| ContainerSummary {
                id: c.id.clone(),
                name: c.name.clone(),
                image: c.image.clone(),
                state: format!("{:?}", c.state).to_lowercase(),
                labels: c.labels.clone(),
                port_bindings: c.port_bindings.clone(),
            })
            .collect())
    }

    async fn await_container_health(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<(), ContainerError> {
        let container = self
            .find(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;

        match (container.state, container.health) {
            (ContainerState::Running, HealthState::Healthy)
            | (ContainerState::Running, HealthState::None) => Ok(()),
            (ContainerState::Running, HealthState::Unhealthy) => Err(ContainerError::Unhealthy(
                format!("container {} reported unhealthy", container.name),
            )),
            (ContainerState::Running, HealthState::Starting) => {
                // Scripted as never becoming healthy: run out the clock
                tokio::time::sleep(timeout).await;
                Err(ContainerError::Unhealthy(format!(
                    "container {} did not become healthy within {:?}",
                    container.name, timeout
                )))
            }
            _ => Err(ContainerError::Unhealthy(format!(
                "container {} exited",
                container.name
            ))),
        }
    }
}

#[async_trait]
impl ImageOps for StubRuntime {
    async fn load_image(&self, archive_path: &Path) -> Result<(), ImageError> {
        self.state
            .lock()
            .loaded_archives
            .push(archive_path.to_path_buf());
        Ok(())
    }

    async fn image_exists(&self, _reference: &ImageRef) -> Result<bool, ImageError> {
        Ok(true)
    }
}

#[async_trait]
impl LogOps for StubRuntime {
    async fn container_logs(&self, id: &ContainerId) -> Result<String, LogError> {
        let container = self
            .find(id.as_str())
            .ok_or_else(|| LogError::NotFound(id.to_string()))?;
        let state = self.state.lock();
        Ok(state
            .logs
            .get(&container.name)
            .cloned()
            .unwrap_or_else(|| format!("no output captured for {}", container.name)))
    }
}
