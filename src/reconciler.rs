// ABOUTME: Periodic health reconciliation for Ready functions.
// ABOUTME: Demotes Ready to Error on unhealthy containers; never promotes.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::{FunctionRecord, FunctionState, FunctionStatus};
use crate::runtime::ContainerOps;
use crate::store::{RecordFilter, RecordStore};
use crate::types::ContainerId;

/// Default sweep interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Default per-function health check timeout.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Message recorded when a Ready function's container fails its check.
pub const UNHEALTHY_MESSAGE: &str = "Container is not healthy";

/// Detects drift between declared Ready state and observed container health.
///
/// The reconciler only ever demotes Ready to Error. It never deletes
/// records, never touches containers, and never promotes Error back to
/// Ready; recovery is the lifecycle engine's sole authority.
pub struct HealthReconciler<R, S> {
    runtime: Arc<R>,
    store: Arc<S>,
    interval: Duration,
    check_timeout: Duration,
}

impl<R, S> HealthReconciler<R, S>
where
    R: ContainerOps + 'static,
    S: RecordStore + 'static,
{
    pub fn new(runtime: Arc<R>, store: Arc<S>) -> Self {
        Self {
            runtime,
            store,
            interval: DEFAULT_INTERVAL,
            check_timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_check_timeout(mut self, check_timeout: Duration) -> Self {
        self.check_timeout = check_timeout;
        self
    }

    /// Run sweeps on the configured interval until the task is aborted.
    ///
    /// Sweeps are serial; if one outruns the interval, missed ticks are
    /// dropped rather than queued.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                self.sweep_once().await;
            }
        })
    }

    /// One full sweep over every namespace.
    ///
    /// A failure on one function is logged and does not abort the sweep.
    pub async fn sweep_once(&self) {
        let namespaces = match self.store.namespaces().await {
            Ok(namespaces) => namespaces,
            Err(e) => {
                tracing::warn!("health sweep skipped, failed to list namespaces: {}", e);
                return;
            }
        };

        for namespace in namespaces {
            let records = match self
                .store
                .get_functions(&RecordFilter::namespaced(&namespace))
                .await
            {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(namespace = %namespace, "failed to list functions: {}", e);
                    continue;
                }
            };

            // Only Ready functions are checked; Building and Error are left alone
            let checks = records
                .into_iter()
                .filter(|r| r.status.state == FunctionState::Ready)
                .map(|r| self.check_function(r));
            futures::future::join_all(checks).await;
        }
    }

    async fn check_function(&self, record: FunctionRecord) {
        let identity = match record.identity() {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!("skipping record with invalid identity: {}", e);
                return;
            }
        };

        let container = ContainerId::new(identity.container_name());
        match self
            .runtime
            .await_container_health(&container, self.check_timeout)
            .await
        {
            Ok(()) => {}
            Err(check_err) => {
                tracing::warn!(
                    function = %identity,
                    "function container failed health check: {}",
                    check_err
                );
                let http_port = record.status.http_port;
                let mut status = FunctionStatus::error(UNHEALTHY_MESSAGE);
                status.http_port = http_port;
                let demoted = FunctionRecord::new(record.config, status);
                if let Err(store_err) = self.store.upsert_function(demoted).await {
                    tracing::error!(
                        function = %identity,
                        "failed to record unhealthy function: {}",
                        store_err
                    );
                }
            }
        }
    }
}
