// ABOUTME: Namespace identity scoping with platform default resolution.
// ABOUTME: Maps the self-namespace sentinel and empty input to the default.

use std::fmt;
use thiserror::Error;

/// Namespace used when a function does not name one.
pub const DEFAULT_NAMESPACE: &str = "nuclio";

/// Sentinel meaning "whatever namespace the platform itself runs in".
pub const SELF_NAMESPACE_SENTINEL: &str = "@nuclio.selfNamespace";

#[derive(Debug, Error)]
pub enum NamespaceError {
    #[error("namespace must be at most 63 characters, got {0}")]
    Length(usize),

    #[error("namespace may only contain lowercase letters, digits, and hyphens (found {0:?})")]
    Charset(char),
}

/// A validated, resolved namespace.
///
/// Construction always resolves defaults first: empty input and the
/// self-namespace sentinel both become [`DEFAULT_NAMESPACE`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    /// Resolve and validate a raw namespace string.
    pub fn resolve(raw: &str) -> Result<Self, NamespaceError> {
        let value = Self::resolve_default(raw);

        if value.len() > 63 {
            return Err(NamespaceError::Length(value.len()));
        }

        if let Some(bad) = value
            .chars()
            .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '-')
        {
            return Err(NamespaceError::Charset(bad));
        }

        Ok(Self(value))
    }

    /// Map empty input and the self-namespace sentinel to the default.
    pub fn resolve_default(raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() || raw == SELF_NAMESPACE_SENTINEL {
            DEFAULT_NAMESPACE.to_string()
        } else {
            raw.to_string()
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_resolves_to_default() {
        assert_eq!(Namespace::resolve("").unwrap().as_str(), DEFAULT_NAMESPACE);
    }

    #[test]
    fn sentinel_resolves_to_default() {
        let ns = Namespace::resolve(SELF_NAMESPACE_SENTINEL).unwrap();
        assert_eq!(ns.as_str(), DEFAULT_NAMESPACE);
    }

    #[test]
    fn explicit_namespace_survives() {
        assert_eq!(Namespace::resolve("staging").unwrap().as_str(), "staging");
    }

    #[test]
    fn uppercase_rejected() {
        assert!(matches!(
            Namespace::resolve("Staging"),
            Err(NamespaceError::Charset('S'))
        ));
    }
}
