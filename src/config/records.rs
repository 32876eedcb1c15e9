// ABOUTME: Durable records for functions, projects, and function events.
// ABOUTME: Functions and projects key on (namespace, name); events on a generated ID.

use super::{FunctionConfig, FunctionIdentity, FunctionStatus, IdentityError};
use crate::types::EventId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The authoritative record for one function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionRecord {
    #[serde(flatten)]
    pub config: FunctionConfig,
    pub status: FunctionStatus,
}

impl FunctionRecord {
    pub fn new(config: FunctionConfig, status: FunctionStatus) -> Self {
        Self { config, status }
    }

    pub fn identity(&self) -> Result<FunctionIdentity, IdentityError> {
        self.config.identity()
    }

    /// Resolved namespace the record lives in.
    pub fn namespace(&self) -> String {
        crate::types::Namespace::resolve_default(&self.config.meta.namespace)
    }

    pub fn name(&self) -> &str {
        &self.config.meta.name
    }
}

/// A labeling grouping over functions and events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub name: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub labels: HashMap<String, String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// A saved invocation template, associated with a function by label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionEventRecord {
    pub id: EventId,

    #[serde(default)]
    pub namespace: String,

    /// Carries the owning function via the `nuclio.io/function-name` label.
    #[serde(default)]
    pub labels: HashMap<String, String>,

    pub spec: FunctionEventSpec,
}

impl FunctionEventRecord {
    /// Name of the function this event belongs to, if labeled.
    pub fn function_name(&self) -> Option<&str> {
        self.labels
            .get(super::labels::FUNCTION_NAME)
            .map(String::as_str)
    }
}

/// Invocation template payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEventSpec {
    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub trigger_name: String,

    #[serde(default)]
    pub body: String,

    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}
