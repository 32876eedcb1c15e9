// ABOUTME: Shared fixtures for integration tests.
// ABOUTME: Stub-backed platform with a temp-dir record store.

#![allow(dead_code)]

use funcdock::builder::PrebuiltImageBuilder;
use funcdock::config::{
    FunctionConfig, FunctionEventRecord, FunctionEventSpec, FunctionMeta, FunctionSpec, labels,
};
use funcdock::platform::LocalPlatform;
use funcdock::runtime::StubRuntime;
use funcdock::store::FileStore;
use funcdock::types::{EventId, ImageRef};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub type StubPlatform = LocalPlatform<StubRuntime, FileStore, PrebuiltImageBuilder<StubRuntime>>;

/// A platform wired against the stub runtime and a throwaway store.
pub struct TestPlatform {
    pub platform: StubPlatform,
    pub runtime: Arc<StubRuntime>,
    pub store: Arc<FileStore>,
    state_dir: TempDir,
}

pub fn test_platform() -> TestPlatform {
    let state_dir = TempDir::new().expect("temp state dir");
    let runtime = Arc::new(StubRuntime::new());
    let store = Arc::new(FileStore::open(state_dir.path()).expect("open store"));
    let builder = Arc::new(PrebuiltImageBuilder::new(runtime.clone()));
    let platform = LocalPlatform::new(runtime.clone(), store.clone(), builder);

    TestPlatform {
        platform,
        runtime,
        store,
        state_dir,
    }
}

/// Minimal valid function config for tests.
pub fn function_config(name: &str, image: &str) -> FunctionConfig {
    FunctionConfig {
        meta: FunctionMeta {
            name: name.to_string(),
            namespace: "nuclio".to_string(),
            ..Default::default()
        },
        spec: FunctionSpec {
            image: Some(ImageRef::parse(image).expect("valid image ref")),
            readiness_timeout: Duration::from_secs(10),
            ..Default::default()
        },
    }
}

/// A function event owned by `function` via the function-name label.
pub fn function_event(id: &str, function: &str) -> FunctionEventRecord {
    let mut event_labels = HashMap::new();
    event_labels.insert(labels::FUNCTION_NAME.to_string(), function.to_string());
    FunctionEventRecord {
        id: EventId::new(id),
        namespace: "nuclio".to_string(),
        labels: event_labels,
        spec: FunctionEventSpec {
            display_name: format!("event {}", id),
            trigger_name: "http".to_string(),
            body: "{}".to_string(),
            attributes: HashMap::new(),
        },
    }
}
