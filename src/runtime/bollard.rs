// ABOUTME: Bollard-based container runtime implementation.
// ABOUTME: Supports both Docker and Podman via Docker-compatible API.

use crate::runtime::traits::sealed::Sealed;
use crate::runtime::traits::{
    ContainerError, ContainerFilters, ContainerInfo, ContainerOps, ContainerState,
    ContainerSummary, HealthState, ImageError, ImageOps, LogError, LogOps, PortBindings, RunConfig,
};
use crate::runtime::types::RuntimeType;
use crate::types::{ContainerId, ImageRef};
use async_trait::async_trait;
use bollard::Docker;
use bollard::models::{ContainerCreateBody, HostConfig, Mount, MountTypeEnum, PortBinding};
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, InspectContainerOptions, ListContainersOptions,
    LogsOptions, RemoveContainerOptions,
};
use futures::StreamExt;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_container_create_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::ImageNotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ContainerError::AlreadyExists(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_not_found_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_image_load_error(e: bollard::errors::Error, archive: &Path) -> ImageError {
    ImageError::LoadFailed(format!("{}: {}", archive.display(), e))
}

fn map_log_error(e: bollard::errors::Error) -> LogError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => LogError::NotFound(message.clone()),
        _ => LogError::StreamError(e.to_string()),
    }
}

// =============================================================================
// BollardRuntime
// =============================================================================

/// Container runtime implementation using bollard.
///
/// Supports both Docker and Podman via the Docker-compatible API on a local
/// socket.
pub struct BollardRuntime {
    client: Docker,
    runtime_type: RuntimeType,
}

impl BollardRuntime {
    /// Create a new BollardRuntime from an existing client.
    pub fn new(client: Docker, runtime_type: RuntimeType) -> Self {
        Self {
            client,
            runtime_type,
        }
    }

    /// Connect to a container runtime using detected runtime info.
    ///
    /// Use with `detect_local()` to connect to whatever socket is present.
    pub fn connect(info: &super::types::RuntimeInfo) -> Result<Self, ContainerError> {
        let client =
            Docker::connect_with_unix(&info.socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| ContainerError::Runtime(e.to_string()))?;
        Ok(Self::new(client, info.runtime_type))
    }

    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }

    /// Verify the runtime socket responds.
    pub async fn ping(&self) -> Result<(), ContainerError> {
        self.client
            .ping()
            .await
            .map_err(|e| ContainerError::Runtime(e.to_string()))?;
        Ok(())
    }
}

impl Sealed for BollardRuntime {}

#[async_trait]
impl ContainerOps for BollardRuntime {
    async fn run_container(&self, config: &RunConfig) -> Result<ContainerId, ContainerError> {
        let image_name = config.image.to_string();

        let env: Vec<String> = config
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();

        let mut host_config = HostConfig::default();

        let mounts: Vec<Mount> = config
            .volumes
            .iter()
            .map(|m| Mount {
                source: Some(m.source.clone()),
                target: Some(m.target.clone()),
                typ: Some(MountTypeEnum::BIND),
                read_only: Some(m.read_only),
                ..Default::default()
            })
            .collect();
        if !mounts.is_empty() {
            host_config.mounts = Some(mounts);
        }

        let mut port_bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();
        let mut exposed_ports: Vec<String> = Vec::new();
        for port in &config.ports {
            let port_key = format!("{}/tcp", port.container_port);
            exposed_ports.push(port_key.clone());
            port_bindings.insert(
                port_key,
                Some(vec![PortBinding {
                    host_ip: None,
                    host_port: Some(port.host_port.to_string()),
                }]),
            );
        }
        if !port_bindings.is_empty() {
            host_config.port_bindings = Some(port_bindings);
        }

        if let Some(ref network) = config.network {
            host_config.network_mode = Some(network.clone());
        }

        let container_config = ContainerCreateBody {
            image: Some(image_name),
            env: if env.is_empty() { None } else { Some(env) },
            labels: if config.labels.is_empty() {
                None
            } else {
                Some(config.labels.clone())
            },
            host_config: Some(host_config),
            exposed_ports: if exposed_ports.is_empty() {
                None
            } else {
                Some(exposed_ports)
            },
            ..Default::default()
        };

        let opts = CreateContainerOptions {
            name: Some(config.name.clone()),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(Some(opts), container_config)
            .await
            .map_err(map_container_create_error)?;
        let id = ContainerId::new(response.id);

        if let Err(e) = self
            .client
            .start_container(
                id.as_str(),
                None::<bollard::query_parameters::StartContainerOptions>,
            )
            .await
        {
            // Clean up the created container so the name is free for a retry
            let _ = self.remove_container(id.as_str(), true).await;
            return Err(ContainerError::Runtime(format!(
                "failed to start container {}: {}",
                config.name, e
            )));
        }

        Ok(id)
    }

    async fn remove_container(&self, id_or_name: &str, force: bool) -> Result<(), ContainerError> {
        let opts = RemoveContainerOptions {
            force,
            ..Default::default()
        };

        self.client
            .remove_container(id_or_name, Some(opts))
            .await
            .map_err(map_container_not_found_error)?;

        Ok(())
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let details = self
            .client
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(map_container_not_found_error)?;

        let state = details
            .state
            .as_ref()
            .and_then(|s| s.status)
            .map(|s| match s {
                bollard::models::ContainerStateStatusEnum::CREATED => ContainerState::Created,
                bollard::models::ContainerStateStatusEnum::RUNNING => ContainerState::Running,
                bollard::models::ContainerStateStatusEnum::PAUSED => ContainerState::Paused,
                bollard::models::ContainerStateStatusEnum::RESTARTING => ContainerState::Restarting,
                bollard::models::ContainerStateStatusEnum::REMOVING => ContainerState::Removing,
                bollard::models::ContainerStateStatusEnum::EXITED => ContainerState::Exited,
                bollard::models::ContainerStateStatusEnum::DEAD => ContainerState::Dead,
                _ => ContainerState::Exited,
            })
            .unwrap_or(ContainerState::Exited);

        let health = details
            .state
            .as_ref()
            .and_then(|s| s.health.as_ref())
            .and_then(|h| h.status)
            .map(|s| match s {
                bollard::models::HealthStatusEnum::STARTING => HealthState::Starting,
                bollard::models::HealthStatusEnum::HEALTHY => HealthState::Healthy,
                bollard::models::HealthStatusEnum::UNHEALTHY => HealthState::Unhealthy,
                _ => HealthState::None,
            });

        let mut port_bindings: PortBindings = HashMap::new();
        if let Some(ref host_config) = details.host_config
            && let Some(ref bindings) = host_config.port_bindings
        {
            for (key, value) in bindings {
                let mapped = value
                    .iter()
                    .flatten()
                    .map(|b| crate::runtime::traits::PortBinding {
                        host_ip: b.host_ip.clone(),
                        host_port: b.host_port.as_deref().and_then(|p| p.parse().ok()),
                    })
                    .collect();
                port_bindings.insert(key.clone(), mapped);
            }
        }

        Ok(ContainerInfo {
            id: id.clone(),
            name: details
                .name
                .unwrap_or_default()
                .trim_start_matches('/')
                .to_string(),
            image: details
                .config
                .as_ref()
                .and_then(|c| c.image.clone())
                .unwrap_or_default(),
            state,
            health,
            labels: details.config.and_then(|c| c.labels).unwrap_or_default(),
            port_bindings,
        })
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let mut filter_map: HashMap<String, Vec<String>> = HashMap::new();

        if let Some(ref name) = filters.name {
            filter_map.insert("name".to_string(), vec![name.clone()]);
        }

        for (key, value) in &filters.labels {
            filter_map
                .entry("label".to_string())
                .or_default()
                .push(format!("{}={}", key, value));
        }

        let opts = ListContainersOptions {
            all: filters.stopped,
            filters: Some(filter_map),
            ..Default::default()
        };

        // Podman reports "stopping" as a container state during shutdown, but
        // bollard doesn't recognize it and fails deserialization. Retry after a
        // short delay since "stopping" is transient.
        let mut last_error = None;
        for attempt in 0..3 {
            match self.client.list_containers(Some(opts.clone())).await {
                Ok(containers) => {
                    return Ok(containers
                        .into_iter()
                        .map(|c| {
                            let id = c.id.unwrap_or_default();
                            let names = c.names.unwrap_or_default();
                            let name = names
                                .first()
                                .map(|n| n.trim_start_matches('/').to_string())
                                .unwrap_or_default();

                            let mut port_bindings: PortBindings = HashMap::new();
                            for port in c.ports.unwrap_or_default() {
                                let proto = port
                                    .typ
                                    .map(|t| format!("{:?}", t).to_lowercase())
                                    .unwrap_or_else(|| "tcp".to_string());
                                let key = format!("{}/{}", port.private_port, proto);
                                port_bindings.entry(key).or_default().push(
                                    crate::runtime::traits::PortBinding {
                                        host_ip: port.ip.clone(),
                                        host_port: port
                                            .public_port
                                            .and_then(|p| u16::try_from(p).ok()),
                                    },
                                );
                            }

                            ContainerSummary {
                                id: ContainerId::new(id),
                                name,
                                image: c.image.unwrap_or_default(),
                                state: c
                                    .state
                                    .map(|s| format!("{:?}", s).to_lowercase())
                                    .unwrap_or_default(),
                                labels: c.labels.unwrap_or_default(),
                                port_bindings,
                            }
                        })
                        .collect());
                }
                Err(e) => {
                    let err_str = e.to_string();
                    if (err_str.contains("unknown variant `stopping`")
                        || err_str.contains("unknown variant `stopped`"))
                        && attempt < 2
                    {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        last_error = Some(err_str);
                        continue;
                    }
                    return Err(ContainerError::Runtime(err_str));
                }
            }
        }

        Err(ContainerError::Runtime(
            last_error.unwrap_or_else(|| "list_containers failed".to_string()),
        ))
    }

    async fn await_container_health(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<(), ContainerError> {
        let start = std::time::Instant::now();
        let poll_interval = Duration::from_secs(1);

        loop {
            let info = self.inspect_container(id).await?;

            match info.state {
                ContainerState::Exited | ContainerState::Dead => {
                    return Err(ContainerError::Unhealthy(format!(
                        "container {} exited",
                        info.name
                    )));
                }
                ContainerState::Running => match info.health {
                    // No healthcheck configured: running is as healthy as it gets
                    Some(HealthState::Healthy) | Some(HealthState::None) | None => return Ok(()),
                    Some(HealthState::Unhealthy) => {
                        return Err(ContainerError::Unhealthy(format!(
                            "container {} reported unhealthy",
                            info.name
                        )));
                    }
                    Some(HealthState::Starting) => {}
                },
                _ => {}
            }

            if start.elapsed() >= timeout {
                return Err(ContainerError::Unhealthy(format!(
                    "container {} did not become healthy within {:?}",
                    info.name, timeout
                )));
            }

            tokio::time::sleep(poll_interval).await;
        }
    }
}

#[async_trait]
impl ImageOps for BollardRuntime {
    async fn load_image(&self, archive_path: &Path) -> Result<(), ImageError> {
        let contents = tokio::fs::read(archive_path)
            .await
            .map_err(|e| ImageError::LoadFailed(format!("{}: {}", archive_path.display(), e)))?;

        let opts = CreateImageOptions {
            from_src: Some("-".to_string()),
            ..Default::default()
        };

        let mut stream = self.client.create_image(
            Some(opts),
            Some(bollard::body_full(bytes::Bytes::from(contents))),
            None,
        );
        while let Some(result) = stream.next().await {
            result.map_err(|e| map_image_load_error(e, archive_path))?;
        }

        Ok(())
    }

    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError> {
        let image_name = reference.to_string();

        match self.client.inspect_image(&image_name).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(ImageError::Runtime(format!(
                "failed to inspect {}: {}",
                image_name, e
            ))),
        }
    }
}

#[async_trait]
impl LogOps for BollardRuntime {
    async fn container_logs(&self, id: &ContainerId) -> Result<String, LogError> {
        let opts = LogsOptions {
            stdout: true,
            stderr: true,
            follow: false,
            timestamps: false,
            tail: "all".to_string(),
            ..Default::default()
        };

        let mut stream = self.client.logs(id.as_str(), Some(opts));
        let mut collected = String::new();

        while let Some(result) = stream.next().await {
            let output = result.map_err(map_log_error)?;
            collected.push_str(&String::from_utf8_lossy(&output.into_bytes()));
        }

        Ok(collected)
    }
}
