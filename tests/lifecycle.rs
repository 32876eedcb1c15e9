// ABOUTME: Integration tests for the function lifecycle engine.
// ABOUTME: Drives create/redeploy/delete against the stub runtime.

mod support;

use funcdock::builder::{BuildError, BuiltImage, ImageBuilder};
use funcdock::config::{FunctionConfig, FunctionState, MESSAGE_LIMIT, labels};
use funcdock::lifecycle::{CreateFunctionOptions, ErrorKind, GetFunctionsFilter};
use funcdock::logstream::DeployLogger;
use funcdock::platform::LocalPlatform;
use funcdock::runtime::{HealthState, StubRuntime};
use funcdock::store::{FileStore, RecordStore};
use async_trait::async_trait;
use std::sync::Arc;

fn name_filter(name: &str) -> GetFunctionsFilter {
    GetFunctionsFilter {
        namespace: "nuclio".to_string(),
        name: Some(name.to_string()),
        project: None,
    }
}

/// Test: Happy path. Building transitions to Ready, one labeled container
/// runs under the deterministic name, and the port lands in range.
#[tokio::test]
async fn create_function_happy_path() {
    let fixture = support::test_platform();
    let config = support::function_config("echo", "echo:1");

    let result = fixture
        .platform
        .create_function(CreateFunctionOptions::new(config))
        .await
        .expect("create should succeed");

    assert!(result.http_port >= 1024);

    let records = fixture
        .platform
        .get_functions(&name_filter("echo"))
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status.state, FunctionState::Ready);
    assert_eq!(records[0].status.http_port, Some(result.http_port));

    let containers = fixture.runtime.containers();
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].name, "nuclio-echo");
    assert_eq!(
        containers[0].labels.get(labels::PLATFORM).map(String::as_str),
        Some(labels::PLATFORM_LOCAL)
    );
    assert_eq!(
        containers[0].labels.get(labels::FUNCTION_NAME).map(String::as_str),
        Some("echo")
    );
    assert!(containers[0].labels.contains_key(labels::FUNCTION_SPEC));
}

/// Test: Redeploy without an explicit port keeps the previously bound port.
#[tokio::test]
async fn redeploy_preserves_assigned_port() {
    let fixture = support::test_platform();

    let first = fixture
        .platform
        .create_function(CreateFunctionOptions::new(support::function_config(
            "echo", "echo:1",
        )))
        .await
        .unwrap();

    let second = fixture
        .platform
        .create_function(CreateFunctionOptions::new(support::function_config(
            "echo", "echo:2",
        )))
        .await
        .unwrap();

    assert_eq!(first.http_port, second.http_port);
    // Old container gone, exactly one remains
    assert_eq!(fixture.runtime.containers().len(), 1);
    assert_eq!(fixture.runtime.containers()[0].image, "echo:2");
}

/// Test: An explicit spec port wins, and survives being removed on redeploy.
#[tokio::test]
async fn explicit_port_wins_and_persists() {
    let fixture = support::test_platform();

    let mut config = support::function_config("echo", "echo:1");
    config.spec.http_port = Some(9000);
    let first = fixture
        .platform
        .create_function(CreateFunctionOptions::new(config))
        .await
        .unwrap();
    assert_eq!(first.http_port, 9000);

    // Redeploy with the explicit port removed: previous binding is reused
    let second = fixture
        .platform
        .create_function(CreateFunctionOptions::new(support::function_config(
            "echo", "echo:1",
        )))
        .await
        .unwrap();
    assert_eq!(second.http_port, 9000);
}

/// Test: Readiness failure records Error with a log excerpt and keeps the
/// container for inspection.
#[tokio::test]
async fn readiness_failure_records_error_and_keeps_container() {
    let fixture = support::test_platform();
    fixture.runtime.set_health("nuclio-slow", HealthState::Unhealthy);
    fixture.runtime.set_logs("nuclio-slow", "processor exploded");

    let mut config = support::function_config("slow", "slow:1");
    config.spec.readiness_timeout = std::time::Duration::from_secs(1);

    let err = fixture
        .platform
        .create_function(CreateFunctionOptions::new(config))
        .await
        .expect_err("create should fail");
    assert_eq!(err.kind(), ErrorKind::DeployFailed);

    let records = fixture
        .platform
        .get_functions(&name_filter("slow"))
        .await
        .unwrap();
    assert_eq!(records[0].status.state, FunctionState::Error);
    let message = records[0].status.message.as_deref().unwrap();
    assert!(message.contains("processor exploded"));

    // Failing container is left intact for debugging
    assert_eq!(fixture.runtime.containers().len(), 1);
}

/// Test: A create call never leaves Building behind, success or failure.
#[tokio::test]
async fn terminal_state_is_never_building() {
    let fixture = support::test_platform();

    fixture
        .platform
        .create_function(CreateFunctionOptions::new(support::function_config(
            "ok", "ok:1",
        )))
        .await
        .unwrap();

    fixture.runtime.set_health("nuclio-bad", HealthState::Unhealthy);
    let _ = fixture
        .platform
        .create_function(CreateFunctionOptions::new(support::function_config(
            "bad", "bad:1",
        )))
        .await;

    for name in ["ok", "bad"] {
        let records = fixture.platform.get_functions(&name_filter(name)).await.unwrap();
        assert_ne!(records[0].status.state, FunctionState::Building, "{}", name);
    }
}

/// Test: The creation-state notification fires once the record is committed.
#[tokio::test]
async fn creation_state_updated_signal_fires() {
    let fixture = support::test_platform();
    let (tx, rx) = tokio::sync::oneshot::channel();

    let mut opts = CreateFunctionOptions::new(support::function_config("echo", "echo:1"));
    opts.creation_state_updated = Some(tx);

    fixture.platform.create_function(opts).await.unwrap();
    rx.await.expect("signal should have been sent");
}

/// Test: Deleting a function cascades its events and removes its containers.
#[tokio::test]
async fn delete_cascades_events_and_containers() {
    let fixture = support::test_platform();

    fixture
        .platform
        .create_function(CreateFunctionOptions::new(support::function_config(
            "echo", "echo:1",
        )))
        .await
        .unwrap();
    fixture
        .platform
        .create_function_event(support::function_event("ev-1", "echo"))
        .await
        .unwrap();
    fixture
        .platform
        .create_function_event(support::function_event("ev-2", "echo"))
        .await
        .unwrap();
    fixture
        .platform
        .create_function_event(support::function_event("ev-other", "other"))
        .await
        .unwrap();

    fixture.platform.delete_function("nuclio", "echo").await.unwrap();

    assert!(fixture
        .platform
        .get_functions(&name_filter("echo"))
        .await
        .unwrap()
        .is_empty());
    assert!(fixture
        .platform
        .get_function_events("nuclio", Some("echo"))
        .await
        .unwrap()
        .is_empty());
    // Unrelated event survives
    assert_eq!(
        fixture
            .platform
            .get_function_events("nuclio", None)
            .await
            .unwrap()
            .len(),
        1
    );
    assert!(fixture.runtime.containers().is_empty());
}

/// Test: Delete is idempotent; the second call reports NotFound, nothing else.
#[tokio::test]
async fn delete_is_idempotent() {
    let fixture = support::test_platform();

    fixture
        .platform
        .create_function(CreateFunctionOptions::new(support::function_config(
            "echo", "echo:1",
        )))
        .await
        .unwrap();

    fixture.platform.delete_function("nuclio", "echo").await.unwrap();
    let err = fixture
        .platform
        .delete_function("nuclio", "echo")
        .await
        .expect_err("second delete should report NotFound");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

/// Test: Update refuses a function that was never created.
#[tokio::test]
async fn update_missing_function_is_not_found() {
    let fixture = support::test_platform();
    let err = fixture
        .platform
        .update_function(CreateFunctionOptions::new(support::function_config(
            "ghost", "ghost:1",
        )))
        .await
        .expect_err("update should fail");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

/// Test: Missing identity fields fail validation without mutating state.
#[tokio::test]
async fn invalid_identity_fails_validation() {
    let fixture = support::test_platform();
    let mut config = support::function_config("echo", "echo:1");
    config.meta.name = String::new();

    let err = fixture
        .platform
        .create_function(CreateFunctionOptions::new(config))
        .await
        .expect_err("create should fail validation");
    assert_eq!(err.kind(), ErrorKind::Validation);

    // No record, no container
    assert!(fixture
        .platform
        .get_functions(&GetFunctionsFilter {
            namespace: "nuclio".to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
        .is_empty());
    assert!(fixture.runtime.containers().is_empty());
}

/// Test: Pending deploy-log entries drain into status.logs exactly once.
#[tokio::test]
async fn get_functions_drains_deploy_logs() {
    let fixture = support::test_platform();
    fixture
        .platform
        .create_function(CreateFunctionOptions::new(support::function_config(
            "echo", "echo:1",
        )))
        .await
        .unwrap();

    let first = fixture.platform.get_functions(&name_filter("echo")).await.unwrap();
    assert!(!first[0].status.logs.is_empty());

    let second = fixture.platform.get_functions(&name_filter("echo")).await.unwrap();
    assert!(second[0].status.logs.is_empty());
}

// A builder that fails with an oversized message.
struct ExplodingBuilder;

#[async_trait]
impl ImageBuilder for ExplodingBuilder {
    async fn build(
        &self,
        _config: &FunctionConfig,
        _logger: &DeployLogger,
    ) -> Result<BuiltImage, BuildError> {
        Err(BuildError::Failed("b".repeat(MESSAGE_LIMIT * 2)))
    }
}

/// Test: Build failures surface as BuildFailed and the recorded message is
/// hard-bounded.
#[tokio::test]
async fn build_failure_message_is_bounded() {
    let state_dir = tempfile::TempDir::new().unwrap();
    let runtime = Arc::new(StubRuntime::new());
    let store = Arc::new(FileStore::open(state_dir.path()).unwrap());
    let platform = LocalPlatform::new(runtime, store.clone(), Arc::new(ExplodingBuilder));

    let err = platform
        .create_function(CreateFunctionOptions::new(support::function_config(
            "huge", "huge:1",
        )))
        .await
        .expect_err("build should fail");
    assert_eq!(err.kind(), ErrorKind::BuildFailed);

    let records = store
        .get_functions(&funcdock::store::RecordFilter::one("nuclio", "huge"))
        .await
        .unwrap();
    assert_eq!(records[0].status.state, FunctionState::Error);
    assert!(records[0].status.message.as_ref().unwrap().len() <= MESSAGE_LIMIT);
}
