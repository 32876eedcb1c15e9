// ABOUTME: Platform facade wiring store, runtime, builder, and reconciler.
// ABOUTME: CRUD for functions/projects/events plus network and env defaults.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::builder::ImageBuilder;
use crate::config::{FunctionEventRecord, ProjectRecord};
use crate::lifecycle::{
    CreateFunctionOptions, CreateFunctionResult, GetFunctionsFilter, LifecycleEngine,
    PlatformError, StoreErrorExt,
};
use crate::logstream::LogStreamRegistry;
use crate::reconciler::HealthReconciler;
use crate::runtime::FunctionRuntime;
use crate::store::{RecordFilter, RecordStore};
use crate::types::{EventId, Namespace};

/// Gates the background health reconciler.
pub const ENV_CHECK_HEALTHINESS: &str = "NUCLIO_CHECK_FUNCTION_CONTAINERS_HEALTHINESS";

/// Overrides the externally reachable address in test environments.
pub const ENV_TEST_HOST: &str = "NUCLIO_TEST_HOST";

/// Default bridge gateway, reachable from inside containers.
pub const DEFAULT_INVOKE_ADDRESS: &str = "172.17.0.1";

/// True when the healthiness env flag is set to a truthy value.
pub fn healthiness_check_enabled() -> bool {
    std::env::var(ENV_CHECK_HEALTHINESS)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Addresses external clients can use to reach deployed functions.
///
/// Resolution order: explicit parent addresses, the test-host env override,
/// the bridge gateway when running inside a container, otherwise empty
/// (callers fall back to localhost).
pub fn external_ip_addresses(parent: Option<Vec<String>>) -> Vec<String> {
    if let Some(addresses) = parent
        && !addresses.is_empty()
    {
        return addresses;
    }
    if let Ok(host) = std::env::var(ENV_TEST_HOST)
        && !host.is_empty()
    {
        return vec![host];
    }
    if running_in_container() {
        return vec![DEFAULT_INVOKE_ADDRESS.to_string()];
    }
    Vec::new()
}

/// Addresses the platform itself uses to invoke functions.
pub fn default_invoke_ip_addresses() -> Vec<String> {
    vec![DEFAULT_INVOKE_ADDRESS.to_string()]
}

fn running_in_container() -> bool {
    Path::new("/.dockerenv").exists() || Path::new("/run/.containerenv").exists()
}

/// The local deployment backend.
///
/// Owns the process-wide pieces: the deploy-log stream registry and the
/// reconciler task. Both are torn down by [`LocalPlatform::close`].
pub struct LocalPlatform<R, S, B> {
    runtime: Arc<R>,
    store: Arc<S>,
    engine: LifecycleEngine<R, S, B>,
    reconciler_handle: Mutex<Option<JoinHandle<()>>>,
}

impl<R, S, B> LocalPlatform<R, S, B>
where
    R: FunctionRuntime + 'static,
    S: RecordStore + 'static,
    B: ImageBuilder + 'static,
{
    /// Wire a platform from its collaborators.
    ///
    /// The health reconciler starts only when the healthiness env flag is
    /// set; otherwise Ready records are trusted until the next deploy.
    pub fn new(runtime: Arc<R>, store: Arc<S>, builder: Arc<B>) -> Self {
        let streams = Arc::new(LogStreamRegistry::new());
        let engine = LifecycleEngine::new(
            runtime.clone(),
            store.clone(),
            builder,
            streams,
        );

        let reconciler_handle = if healthiness_check_enabled() {
            tracing::info!("starting function container health reconciler");
            Some(HealthReconciler::new(runtime.clone(), store.clone()).spawn())
        } else {
            None
        };

        Self {
            runtime,
            store,
            engine,
            reconciler_handle: Mutex::new(reconciler_handle),
        }
    }

    pub fn runtime(&self) -> &Arc<R> {
        &self.runtime
    }

    /// Stop background work. Safe to call more than once.
    pub fn close(&self) {
        if let Some(handle) = self.reconciler_handle.lock().take() {
            handle.abort();
        }
    }

    // ------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------

    pub async fn create_function(
        &self,
        opts: CreateFunctionOptions,
    ) -> Result<CreateFunctionResult, PlatformError> {
        self.engine.create_function(opts).await
    }

    pub async fn update_function(
        &self,
        opts: CreateFunctionOptions,
    ) -> Result<CreateFunctionResult, PlatformError> {
        self.engine.update_function(opts).await
    }

    pub async fn delete_function(&self, namespace: &str, name: &str) -> Result<(), PlatformError> {
        self.engine.delete_function(namespace, name).await
    }

    pub async fn get_functions(
        &self,
        filter: &GetFunctionsFilter,
    ) -> Result<Vec<crate::config::FunctionRecord>, PlatformError> {
        self.engine.get_functions(filter).await
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    pub async fn create_project(&self, record: ProjectRecord) -> Result<(), PlatformError> {
        self.store.upsert_project(record).await.context_store()
    }

    pub async fn get_projects(
        &self,
        namespace: &str,
        name: Option<&str>,
    ) -> Result<Vec<ProjectRecord>, PlatformError> {
        let filter = RecordFilter {
            namespace: Some(Namespace::resolve_default(namespace)),
            name: name.map(str::to_string),
        };
        self.store.get_projects(&filter).await.context_store()
    }

    pub async fn delete_project(&self, namespace: &str, name: &str) -> Result<(), PlatformError> {
        let namespace = Namespace::resolve_default(namespace);
        self.store
            .delete_project(&namespace, name)
            .await
            .context_store()
    }

    // ------------------------------------------------------------------
    // Function events
    // ------------------------------------------------------------------

    pub async fn create_function_event(
        &self,
        record: FunctionEventRecord,
    ) -> Result<(), PlatformError> {
        self.store.upsert_function_event(record).await.context_store()
    }

    pub async fn get_function_events(
        &self,
        namespace: &str,
        function: Option<&str>,
    ) -> Result<Vec<FunctionEventRecord>, PlatformError> {
        let namespace = Namespace::resolve_default(namespace);
        self.store
            .get_function_events(&namespace, function)
            .await
            .context_store()
    }

    pub async fn delete_function_event(
        &self,
        namespace: &str,
        id: &EventId,
    ) -> Result<(), PlatformError> {
        let namespace = Namespace::resolve_default(namespace);
        self.store
            .delete_function_event(&namespace, id)
            .await
            .context_store()
    }
}

impl<R, S, B> Drop for LocalPlatform<R, S, B> {
    fn drop(&mut self) {
        if let Some(handle) = self.reconciler_handle.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_addresses_prefer_parent() {
        let addrs = external_ip_addresses(Some(vec!["10.0.0.1".to_string()]));
        assert_eq!(addrs, vec!["10.0.0.1".to_string()]);
    }

    #[test]
    fn external_addresses_use_test_host_env() {
        temp_env::with_var(ENV_TEST_HOST, Some("192.168.1.5"), || {
            let addrs = external_ip_addresses(None);
            assert_eq!(addrs, vec!["192.168.1.5".to_string()]);
        });
    }

    #[test]
    fn healthiness_flag_defaults_off() {
        temp_env::with_var(ENV_CHECK_HEALTHINESS, None::<&str>, || {
            assert!(!healthiness_check_enabled());
        });
        temp_env::with_var(ENV_CHECK_HEALTHINESS, Some("true"), || {
            assert!(healthiness_check_enabled());
        });
    }

    #[test]
    fn invoke_addresses_are_the_bridge_gateway() {
        assert_eq!(
            default_invoke_ip_addresses(),
            vec![DEFAULT_INVOKE_ADDRESS.to_string()]
        );
    }
}
