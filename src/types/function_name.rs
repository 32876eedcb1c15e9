// ABOUTME: Function name validation.
// ABOUTME: Names become container name components, so RFC 1123 labels apply.

use std::fmt;
use thiserror::Error;

/// Maximum length of an RFC 1123 label.
const MAX_LABEL_LEN: usize = 63;

#[derive(Debug, Error)]
pub enum FunctionNameError {
    #[error("function name must be 1-{MAX_LABEL_LEN} characters, got {0}")]
    Length(usize),

    #[error("function name may only contain lowercase letters, digits, and hyphens (found {0:?})")]
    Charset(char),

    #[error("function name cannot start or end with a hyphen")]
    Edge,
}

/// A validated function name.
///
/// The name is embedded in the deployed container name `<namespace>-<name>`
/// and in DNS-ish label selectors, so RFC 1123 label rules apply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionName(String);

impl FunctionName {
    pub fn new(value: &str) -> Result<Self, FunctionNameError> {
        if value.is_empty() || value.len() > MAX_LABEL_LEN {
            return Err(FunctionNameError::Length(value.len()));
        }

        if let Some(bad) = value
            .chars()
            .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '-')
        {
            return Err(FunctionNameError::Charset(bad));
        }

        if value.starts_with('-') || value.ends_with('-') {
            return Err(FunctionNameError::Edge);
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
