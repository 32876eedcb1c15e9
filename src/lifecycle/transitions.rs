// ABOUTME: State transition methods for function deploy orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::builder::ImageBuilder;
use crate::config::{FunctionConfig, FunctionRecord, FunctionStatus, labels};
use crate::logstream::DeployLogger;
use crate::ports::PortBroker;
use crate::runtime::{
    ContainerError, ContainerFilters, ContainerOps, LogOps, PortMapping, RunConfig, VolumeMount,
};
use crate::store::{RecordFilter, RecordStore};

use super::Deployment;
use super::error::{BuildErrorExt, ContainerErrorExt, PlatformError, StoreErrorExt};
use super::state::{Building, Built, Deployed, Ready, Validated};

/// Container-side HTTP port every function processor listens on.
pub const FUNCTION_HTTP_PORT: u16 = 8080;

/// Where the processor config lands inside the container.
pub const PROCESSOR_CONFIG_MOUNT: &str = "/etc/nuclio/config/processor/processor.yaml";

// =============================================================================
// Validated -> Building
// =============================================================================

impl Deployment<Validated> {
    /// Commit the record as Building.
    ///
    /// This is the commit point: once the upsert lands, any later failure
    /// must record Error rather than leave Building behind. The prior
    /// record's port is captured as the port-continuity hint.
    #[must_use = "deployment state must be used"]
    pub async fn mark_building<S: RecordStore>(
        self,
        store: &S,
    ) -> Result<Deployment<Building>, PlatformError> {
        let filter = RecordFilter::one(
            self.identity.namespace.as_str(),
            self.identity.name.as_str(),
        );
        let previous_http_port = store
            .get_functions(&filter)
            .await
            .context_store()?
            .pop()
            .and_then(|record| record.status.http_port);

        store
            .upsert_function(FunctionRecord::new(
                self.config.clone(),
                FunctionStatus::building(),
            ))
            .await
            .context_store()?;

        Ok(self.transition(Building { previous_http_port }))
    }
}

// =============================================================================
// Building: teardown, then build
// =============================================================================

impl Deployment<Building> {
    /// Remove containers left over from earlier deploys of this function.
    ///
    /// The first container's bound HTTP port wins as the continuity hint and
    /// overrides the record hint; all matching containers are removed,
    /// stopped ones included.
    #[must_use = "deployment state must be used"]
    pub async fn teardown_previous<R: ContainerOps>(
        self,
        runtime: &R,
        logger: &DeployLogger,
    ) -> Result<Deployment<Building>, PlatformError> {
        let name = self.container_name();
        let existing = runtime
            .list_containers(&ContainerFilters::named(name, true))
            .await
            .context_runtime()?;

        let mut previous_http_port = self.state.previous_http_port;
        if let Some(first) = existing.first()
            && let Some(port) = first.host_port(FUNCTION_HTTP_PORT)
        {
            previous_http_port = Some(port);
        }

        for container in &existing {
            logger.debug(format!("Removing existing container {}", container.name));
            match runtime.remove_container(container.id.as_str(), true).await {
                Ok(()) | Err(ContainerError::NotFound(_)) => {}
                Err(e) => return Err(e).context_runtime(),
            }
        }

        Ok(self.transition(Building { previous_http_port }))
    }

    /// Produce a runnable image through the external builder.
    #[must_use = "deployment state must be used"]
    pub async fn build<B: ImageBuilder>(
        self,
        builder: &B,
        logger: &DeployLogger,
    ) -> Result<Deployment<Built>, PlatformError> {
        logger.info("Building function image");
        let built = builder.build(&self.config, logger).await.context_build()?;
        let previous_http_port = self.state.previous_http_port;
        Ok(self.transition(Built {
            previous_http_port,
            image: built.image,
        }))
    }
}

// =============================================================================
// Built -> Deployed
// =============================================================================

impl Deployment<Built> {
    /// Resolve the host port, materialize the processor config, run the
    /// container.
    #[must_use = "deployment state must be used"]
    pub async fn deploy<R: ContainerOps>(
        self,
        runtime: &R,
        broker: &PortBroker,
        logger: &DeployLogger,
    ) -> Result<Deployment<Deployed>, PlatformError> {
        let http_port = self.resolve_http_port(broker)?;
        let processor_config = write_processor_config(&self.config)?;
        let run = self.run_config(http_port, processor_config)?;

        logger.info(format!(
            "Starting container {} (image {}) on port {}",
            run.name, run.image, http_port
        ));
        let container = runtime.run_container(&run).await.context_run()?;

        Ok(self.transition(Deployed {
            container,
            http_port,
        }))
    }

    /// Host port resolution order: explicit spec port, previously bound
    /// port, fresh ephemeral port.
    fn resolve_http_port(&self, broker: &PortBroker) -> Result<u16, PlatformError> {
        if let Some(port) = self.config.spec.http_port {
            return Ok(port);
        }
        if let Some(port) = self.state.previous_http_port
            && port != 0
        {
            return Ok(port);
        }
        broker
            .allocate()
            .map_err(|e| PlatformError::deploy_failed(format!("failed to allocate port: {}", e)))
    }

    fn run_config(
        &self,
        http_port: u16,
        processor_config: PathBuf,
    ) -> Result<RunConfig, PlatformError> {
        let meta = &self.config.meta;

        let mut container_labels: HashMap<String, String> = HashMap::new();
        container_labels.insert(
            labels::PLATFORM.to_string(),
            labels::PLATFORM_LOCAL.to_string(),
        );
        container_labels.insert(
            labels::NAMESPACE.to_string(),
            self.identity.namespace.to_string(),
        );
        container_labels.insert(
            labels::FUNCTION_NAME.to_string(),
            self.identity.name.to_string(),
        );
        container_labels.insert(
            labels::FUNCTION_SPEC.to_string(),
            serde_json::to_string(&self.config.spec).map_err(|e| {
                PlatformError::deploy_failed(format!("failed to serialize function spec: {}", e))
            })?,
        );
        if !meta.annotations.is_empty() {
            container_labels.insert(
                labels::ANNOTATIONS.to_string(),
                serde_json::to_string(&meta.annotations).map_err(|e| {
                    PlatformError::deploy_failed(format!("failed to serialize annotations: {}", e))
                })?,
            );
        }

        // User labels merge last: user value wins on a reserved key, loudly
        for (key, value) in &meta.labels {
            if labels::is_reserved(key) {
                tracing::warn!(
                    function = %self.identity,
                    label = %key,
                    "user label shadows a reserved platform label"
                );
            }
            container_labels.insert(key.clone(), value.clone());
        }

        let mut volumes = vec![VolumeMount {
            source: processor_config.display().to_string(),
            target: PROCESSOR_CONFIG_MOUNT.to_string(),
            read_only: true,
        }];
        volumes.extend(self.config.spec.volumes.iter().map(|v| VolumeMount {
            source: v.host_path.clone(),
            target: v.mount_path.clone(),
            read_only: false,
        }));

        Ok(RunConfig {
            name: self.container_name(),
            image: self.state.image.clone(),
            env: self.config.spec.env.clone(),
            labels: container_labels,
            ports: vec![PortMapping {
                host_port: http_port,
                container_port: FUNCTION_HTTP_PORT,
            }],
            volumes,
            network: self.config.spec.network.clone(),
        })
    }
}

// =============================================================================
// Deployed -> Ready
// =============================================================================

impl Deployment<Deployed> {
    /// Wait for the container to report healthy.
    ///
    /// On failure the container is left in place so operators can inspect
    /// it; its logs are captured into the error, best effort.
    #[must_use = "deployment state must be used"]
    pub async fn await_ready<R: ContainerOps + LogOps>(
        self,
        runtime: &R,
        logger: &DeployLogger,
    ) -> Result<Deployment<Ready>, PlatformError> {
        let timeout = self.config.spec.readiness_timeout;
        logger.info(format!("Waiting up to {:?} for function readiness", timeout));

        match runtime
            .await_container_health(&self.state.container, timeout)
            .await
        {
            Ok(()) => {
                logger.info("Function container is healthy");
                let Deployed {
                    container,
                    http_port,
                } = self.state.clone();
                Ok(self.transition(Ready {
                    container,
                    http_port,
                }))
            }
            Err(health_err) => {
                let excerpt = match runtime.container_logs(&self.state.container).await {
                    Ok(logs) => logs,
                    Err(log_err) => format!("(container logs unavailable: {})", log_err),
                };
                Err(PlatformError::readiness_failed(format!(
                    "{}; container logs:\n{}",
                    health_err, excerpt
                )))
            }
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Serialize the spec into a processor config document under /tmp.
///
/// The file must live under /tmp for bind-mount portability on macOS
/// container runtimes, and must outlive this call since the container
/// mounts it.
fn write_processor_config(config: &FunctionConfig) -> Result<PathBuf, PlatformError> {
    let body = serde_yaml::to_string(&config.spec).map_err(|e| {
        PlatformError::deploy_failed(format!("failed to serialize processor config: {}", e))
    })?;

    let file = tempfile::Builder::new()
        .prefix("processor-config-")
        .tempfile_in("/tmp")
        .map_err(|e| {
            PlatformError::deploy_failed(format!("failed to create processor config: {}", e))
        })?;
    std::fs::write(file.path(), body).map_err(|e| {
        PlatformError::deploy_failed(format!("failed to write processor config: {}", e))
    })?;

    let (_, path) = file.keep().map_err(|e| {
        PlatformError::deploy_failed(format!("failed to keep processor config: {}", e))
    })?;
    Ok(path)
}
