// ABOUTME: Lifecycle engine: create/update/delete/get for functions.
// ABOUTME: Drives the deploy state machine and records terminal states.

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::builder::ImageBuilder;
use crate::config::{FunctionConfig, FunctionMeta, FunctionRecord, FunctionStatus};
use crate::logstream::{DeployLogger, LogStreamRegistry};
use crate::ports::PortBroker;
use crate::runtime::{ContainerError, ContainerFilters, FunctionRuntime};
use crate::store::{RecordFilter, RecordStore, StoreError};
use crate::types::{ContainerId, Namespace};

use super::Deployment;
use super::error::{ContainerErrorExt, PlatformError, StoreErrorExt, format_error_chain};
use super::state::Building;

/// Options for a create (or update) call.
pub struct CreateFunctionOptions {
    pub config: FunctionConfig,

    /// Signalled once, after the record is committed as Building and prior
    /// containers are gone, so async callers can stop waiting and poll.
    pub creation_state_updated: Option<oneshot::Sender<()>>,
}

impl CreateFunctionOptions {
    pub fn new(config: FunctionConfig) -> Self {
        Self {
            config,
            creation_state_updated: None,
        }
    }
}

/// Result of a successful create.
#[derive(Debug, Clone)]
pub struct CreateFunctionResult {
    pub http_port: u16,
    pub container_id: ContainerId,
}

/// Filter for function reads.
#[derive(Debug, Clone, Default)]
pub struct GetFunctionsFilter {
    /// Raw namespace; empty and the sentinel resolve to the default.
    pub namespace: String,
    pub name: Option<String>,
    /// Filter by `nuclio.io/project-name` label, applied client-side.
    pub project: Option<String>,
}

/// Orchestrates the function lifecycle against the runtime and store.
///
/// Safe for concurrent use across distinct identities. For the same
/// identity, the record store's upsert atomicity is the only mutual
/// exclusion: the first writer wins the Building commit and a racing second
/// writer is last-writer-wins through the store.
pub struct LifecycleEngine<R, S, B> {
    runtime: Arc<R>,
    store: Arc<S>,
    builder: Arc<B>,
    streams: Arc<LogStreamRegistry>,
    broker: PortBroker,
}

impl<R, S, B> LifecycleEngine<R, S, B>
where
    R: FunctionRuntime,
    S: RecordStore,
    B: ImageBuilder,
{
    pub fn new(
        runtime: Arc<R>,
        store: Arc<S>,
        builder: Arc<B>,
        streams: Arc<LogStreamRegistry>,
    ) -> Self {
        Self {
            runtime,
            store,
            builder,
            streams,
            broker: PortBroker::new(),
        }
    }

    /// Deploy a function to the Ready state.
    ///
    /// The terminal record state is always Ready or Error; Building never
    /// survives this call returning.
    pub async fn create_function(
        &self,
        mut opts: CreateFunctionOptions,
    ) -> Result<CreateFunctionResult, PlatformError> {
        let deployment = Deployment::validate(opts.config)?;
        let identity = deployment.identity().clone();
        let logger = DeployLogger::new(&identity, self.streams.sink_for(&identity));
        logger.info(format!("Deploying function {}", identity));

        // Snapshot for the fail path: Error is recorded with this config
        let config = deployment.config().clone();

        let deployment = deployment.mark_building(&*self.store).await?;

        match self
            .drive(deployment, opts.creation_state_updated.take(), &logger)
            .await
        {
            Ok(result) => {
                logger.info(format!(
                    "Function {} is ready on port {}",
                    identity, result.http_port
                ));
                Ok(result)
            }
            Err(err) => {
                self.record_failure(config, &err, &logger).await;
                Err(err)
            }
        }
    }

    /// Steps after the Building commit point.
    async fn drive(
        &self,
        deployment: Deployment<Building>,
        creation_state_updated: Option<oneshot::Sender<()>>,
        logger: &DeployLogger,
    ) -> Result<CreateFunctionResult, PlatformError> {
        let deployment = deployment.teardown_previous(&*self.runtime, logger).await?;

        if let Some(tx) = creation_state_updated {
            // Receiver may have given up; that is their business
            let _ = tx.send(());
        }

        let deployment = deployment.build(&*self.builder, logger).await?;
        let deployment = deployment.deploy(&*self.runtime, &self.broker, logger).await?;
        let deployment = deployment.await_ready(&*self.runtime, logger).await?;

        let (config, ready) = deployment.finish();
        let http_port = ready.http_port();
        let container_id = ready.container_id().clone();

        self.store
            .upsert_function(FunctionRecord::new(config, FunctionStatus::ready(http_port)))
            .await
            .context_store()?;

        Ok(CreateFunctionResult {
            http_port,
            container_id,
        })
    }

    /// Record a terminal Error state without masking the original error.
    async fn record_failure(
        &self,
        config: FunctionConfig,
        err: &PlatformError,
        logger: &DeployLogger,
    ) {
        logger.error(format!("Deploy failed: {}", err));
        // FunctionStatus::error applies the hard message bound
        let record = FunctionRecord::new(config, FunctionStatus::error(format_error_chain(err)));
        if let Err(store_err) = self.store.upsert_function(record).await {
            tracing::error!(
                "failed to record deploy failure, original error stands: {}",
                store_err
            );
        }
    }

    /// Redeploy an existing function with a new config.
    pub async fn update_function(
        &self,
        opts: CreateFunctionOptions,
    ) -> Result<CreateFunctionResult, PlatformError> {
        let identity = opts
            .config
            .identity()
            .map_err(|e| PlatformError::validation(e.to_string()))?;

        let filter = RecordFilter::one(identity.namespace.as_str(), identity.name.as_str());
        if self
            .store
            .get_functions(&filter)
            .await
            .context_store()?
            .is_empty()
        {
            return Err(PlatformError::not_found(format!("function {}", identity)));
        }

        self.create_function(opts).await
    }

    /// Delete a function, its events, and its containers.
    ///
    /// Idempotent: deleting an absent function cleans up leftovers and
    /// reports NotFound.
    pub async fn delete_function(&self, namespace: &str, name: &str) -> Result<(), PlatformError> {
        let namespace = Namespace::resolve_default(namespace);

        let mut missing = false;
        match self.store.delete_function(&namespace, name).await {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => missing = true,
            Err(e) => return Err(e).context_store(),
        }

        // Cascade event deletion concurrently; the first hard error aborts
        let events = self
            .store
            .get_function_events(&namespace, Some(name))
            .await
            .context_store()?;
        futures::future::try_join_all(events.iter().map(|event| {
            let namespace = namespace.clone();
            async move {
                match self
                    .store
                    .delete_function_event(&namespace, &event.id)
                    .await
                {
                    Ok(()) | Err(StoreError::NotFound(_)) => Ok(()),
                    Err(e) => Err(e),
                }
            }
        }))
        .await
        .context_store()?;

        // Remove containers by identity labels; zero containers is fine
        let containers = self
            .runtime
            .list_containers(&ContainerFilters::for_function(&namespace, name, true))
            .await
            .context_runtime()?;
        for container in containers {
            match self
                .runtime
                .remove_container(container.id.as_str(), true)
                .await
            {
                Ok(()) | Err(ContainerError::NotFound(_)) => {}
                Err(e) => return Err(e).context_runtime(),
            }
        }

        let meta = FunctionMeta {
            name: name.to_string(),
            namespace: namespace.clone(),
            ..Default::default()
        };
        if let Ok(identity) = meta.identity() {
            self.streams.remove(&identity);
        }

        if missing {
            Err(PlatformError::not_found(format!(
                "function {}/{}",
                namespace, name
            )))
        } else {
            Ok(())
        }
    }

    /// Read function records, draining pending deploy-log entries into each.
    pub async fn get_functions(
        &self,
        filter: &GetFunctionsFilter,
    ) -> Result<Vec<FunctionRecord>, PlatformError> {
        let record_filter = RecordFilter {
            namespace: Some(Namespace::resolve_default(&filter.namespace)),
            name: filter.name.clone(),
        };
        let mut records = self
            .store
            .get_functions(&record_filter)
            .await
            .context_store()?;

        if let Some(ref project) = filter.project {
            records.retain(|r| r.config.meta.project() == Some(project.as_str()));
        }

        for record in &mut records {
            if let Ok(identity) = record.identity() {
                record.status.logs.extend(self.streams.drain(&identity));
            }
        }

        Ok(records)
    }
}
