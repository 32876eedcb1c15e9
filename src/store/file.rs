// ABOUTME: File-backed record store with an in-memory index.
// ABOUTME: Mutations serialize through one lock and flush via atomic rename.

use super::{RecordFilter, RecordStore, StoreError};
use crate::config::{FunctionEventRecord, FunctionRecord, ProjectRecord};
use crate::types::{EventId, Namespace};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const STATE_FILENAME: &str = "records.json";

/// On-disk shape: flat lists, keys derived on load.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedState {
    #[serde(default)]
    functions: Vec<FunctionRecord>,

    #[serde(default)]
    projects: Vec<ProjectRecord>,

    #[serde(default)]
    events: Vec<FunctionEventRecord>,
}

#[derive(Default)]
struct Index {
    functions: HashMap<(String, String), FunctionRecord>,
    projects: HashMap<(String, String), ProjectRecord>,
    events: HashMap<(String, String), FunctionEventRecord>,
}

/// Record store persisting to a single JSON document.
///
/// Reads come from the in-memory index. Every mutation holds the write mutex
/// for its full duration, so upserts on one identity linearize and a reader
/// immediately after an upsert observes it.
pub struct FileStore {
    path: PathBuf,
    index: Arc<RwLock<Index>>,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    /// Open (or create) a store rooted at `dir`.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(STATE_FILENAME);

        let persisted: PersistedState = if path.exists() {
            serde_json::from_slice(&std::fs::read(&path)?)?
        } else {
            PersistedState::default()
        };

        let mut index = Index::default();
        for record in persisted.functions {
            let key = function_key(&record);
            index.functions.insert(key, record);
        }
        for record in persisted.projects {
            let key = project_key(&record);
            index.projects.insert(key, record);
        }
        for record in persisted.events {
            let key = event_key(&record);
            index.events.insert(key, record);
        }

        Ok(Self {
            path,
            index: Arc::new(RwLock::new(index)),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Flush the current index to disk via temp-file rename.
    fn flush(&self) -> Result<(), StoreError> {
        let persisted = {
            let index = self.index.read();
            PersistedState {
                functions: index.functions.values().cloned().collect(),
                projects: index.projects.values().cloned().collect(),
                events: index.events.values().cloned().collect(),
            }
        };

        let contents = serde_json::to_vec_pretty(&persisted)?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::fs::write(tmp.path(), &contents)?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

fn function_key(record: &FunctionRecord) -> (String, String) {
    (record.namespace(), record.name().to_string())
}

fn project_key(record: &ProjectRecord) -> (String, String) {
    (
        Namespace::resolve_default(&record.namespace),
        record.name.clone(),
    )
}

fn event_key(record: &FunctionEventRecord) -> (String, String) {
    (
        Namespace::resolve_default(&record.namespace),
        record.id.as_str().to_string(),
    )
}

fn matches(filter: &RecordFilter, namespace: &str, name: &str) -> bool {
    if let Some(ref ns) = filter.namespace
        && ns != namespace
    {
        return false;
    }
    if let Some(ref n) = filter.name
        && n != name
    {
        return false;
    }
    true
}

#[async_trait]
impl RecordStore for FileStore {
    async fn upsert_function(&self, record: FunctionRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let key = function_key(&record);
        self.index.write().functions.insert(key, record);
        self.flush()
    }

    async fn get_functions(&self, filter: &RecordFilter) -> Result<Vec<FunctionRecord>, StoreError> {
        let index = self.index.read();
        Ok(index
            .functions
            .iter()
            .filter(|((ns, name), _)| matches(filter, ns, name))
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn delete_function(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let key = (namespace.to_string(), name.to_string());
        if self.index.write().functions.remove(&key).is_none() {
            return Err(StoreError::NotFound(format!("{}/{}", namespace, name)));
        }
        self.flush()
    }

    async fn namespaces(&self) -> Result<Vec<String>, StoreError> {
        let index = self.index.read();
        let namespaces: BTreeSet<String> =
            index.functions.keys().map(|(ns, _)| ns.clone()).collect();
        Ok(namespaces.into_iter().collect())
    }

    async fn upsert_project(&self, record: ProjectRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let key = project_key(&record);
        self.index.write().projects.insert(key, record);
        self.flush()
    }

    async fn get_projects(&self, filter: &RecordFilter) -> Result<Vec<ProjectRecord>, StoreError> {
        let index = self.index.read();
        Ok(index
            .projects
            .iter()
            .filter(|((ns, name), _)| matches(filter, ns, name))
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn delete_project(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let key = (namespace.to_string(), name.to_string());
        if self.index.write().projects.remove(&key).is_none() {
            return Err(StoreError::NotFound(format!("{}/{}", namespace, name)));
        }
        self.flush()
    }

    async fn upsert_function_event(&self, record: FunctionEventRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let key = event_key(&record);
        self.index.write().events.insert(key, record);
        self.flush()
    }

    async fn get_function_events(
        &self,
        namespace: &str,
        function: Option<&str>,
    ) -> Result<Vec<FunctionEventRecord>, StoreError> {
        let index = self.index.read();
        Ok(index
            .events
            .iter()
            .filter(|((ns, _), record)| {
                ns == namespace
                    && function.is_none_or(|f| record.function_name() == Some(f))
            })
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn delete_function_event(
        &self,
        namespace: &str,
        id: &EventId,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let key = (namespace.to_string(), id.as_str().to_string());
        if self.index.write().events.remove(&key).is_none() {
            return Err(StoreError::NotFound(format!("{}/{}", namespace, id)));
        }
        self.flush()
    }
}
