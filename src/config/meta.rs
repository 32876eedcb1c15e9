// ABOUTME: Function identity metadata: namespace, name, labels, annotations.
// ABOUTME: Raw meta is validated into a FunctionIdentity before any mutation.

use crate::types::{FunctionName, FunctionNameError, Namespace, NamespaceError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("function name is required")]
    MissingName,

    #[error("invalid function name: {0}")]
    Name(#[from] FunctionNameError),

    #[error("invalid namespace: {0}")]
    Namespace(#[from] NamespaceError),
}

/// Raw identity metadata as supplied by the caller.
///
/// Namespace may be empty or the self-namespace sentinel; both resolve to the
/// platform default during validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionMeta {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub labels: HashMap<String, String>,

    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

impl FunctionMeta {
    /// Validate the identity fields into a resolved [`FunctionIdentity`].
    pub fn identity(&self) -> Result<FunctionIdentity, IdentityError> {
        if self.name.trim().is_empty() {
            return Err(IdentityError::MissingName);
        }
        Ok(FunctionIdentity {
            namespace: Namespace::resolve(&self.namespace)?,
            name: FunctionName::new(self.name.trim())?,
        })
    }

    /// The project this function belongs to, if labeled.
    pub fn project(&self) -> Option<&str> {
        self.labels.get(super::labels::PROJECT_NAME).map(String::as_str)
    }
}

/// A resolved, validated `(namespace, name)` pair. Globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionIdentity {
    pub namespace: Namespace,
    pub name: FunctionName,
}

impl FunctionIdentity {
    /// Deterministic container name for this function.
    pub fn container_name(&self) -> String {
        format!("{}-{}", self.namespace, self.name)
    }
}

impl fmt::Display for FunctionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_name_is_rejected() {
        let meta = FunctionMeta::default();
        assert!(matches!(meta.identity(), Err(IdentityError::MissingName)));
    }

    #[test]
    fn empty_namespace_resolves_to_default() {
        let meta = FunctionMeta {
            name: "echo".to_string(),
            ..Default::default()
        };
        let identity = meta.identity().unwrap();
        assert_eq!(identity.namespace.as_str(), "nuclio");
        assert_eq!(identity.container_name(), "nuclio-echo");
    }
}
