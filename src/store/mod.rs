// ABOUTME: Record store contract for function, project, and event records.
// ABOUTME: Atomic upserts, filtered reads, read-your-writes within the process.

mod file;

pub use file::FileStore;

use crate::config::{FunctionEventRecord, FunctionRecord, ProjectRecord};
use crate::types::EventId;
use async_trait::async_trait;

/// Errors from record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("upsert lost a race: {0}")]
    Conflict(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Filter for record reads. Empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub namespace: Option<String>,
    pub name: Option<String>,
}

impl RecordFilter {
    /// Match every record in one namespace.
    pub fn namespaced(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: None,
        }
    }

    /// Match exactly one identity.
    pub fn one(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: Some(name.into()),
        }
    }
}

/// Durable map of function/project/event records.
///
/// Upserts on the same identity linearize; reads observe completed writes.
/// Deleting an absent record returns [`StoreError::NotFound`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn upsert_function(&self, record: FunctionRecord) -> Result<(), StoreError>;

    async fn get_functions(&self, filter: &RecordFilter) -> Result<Vec<FunctionRecord>, StoreError>;

    async fn delete_function(&self, namespace: &str, name: &str) -> Result<(), StoreError>;

    /// Distinct namespaces that currently hold function records.
    async fn namespaces(&self) -> Result<Vec<String>, StoreError>;

    async fn upsert_project(&self, record: ProjectRecord) -> Result<(), StoreError>;

    async fn get_projects(&self, filter: &RecordFilter) -> Result<Vec<ProjectRecord>, StoreError>;

    async fn delete_project(&self, namespace: &str, name: &str) -> Result<(), StoreError>;

    async fn upsert_function_event(&self, record: FunctionEventRecord) -> Result<(), StoreError>;

    /// Events in a namespace, optionally filtered by owning function label.
    async fn get_function_events(
        &self,
        namespace: &str,
        function: Option<&str>,
    ) -> Result<Vec<FunctionEventRecord>, StoreError>;

    async fn delete_function_event(
        &self,
        namespace: &str,
        id: &EventId,
    ) -> Result<(), StoreError>;
}
