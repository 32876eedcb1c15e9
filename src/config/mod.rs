// ABOUTME: Function configuration document model and keyed records.
// ABOUTME: Covers meta/spec/status plus project and function-event records.

pub mod labels;
mod meta;
mod records;
mod spec;
mod status;

pub use meta::{FunctionIdentity, FunctionMeta, IdentityError};
pub use records::{FunctionEventRecord, FunctionEventSpec, FunctionRecord, ProjectRecord};
pub use spec::{BuildSpec, FunctionSpec, VolumeSpec, default_readiness_timeout};
pub use status::{FunctionState, FunctionStatus, LogEntry, LogLevel, MESSAGE_LIMIT, truncate_message};

use serde::{Deserialize, Serialize};

/// A declarative function document: identity plus desired spec.
///
/// This is what the CLI reads from `function.yaml` and what callers hand to
/// `create_function`. The status lives on the stored [`FunctionRecord`], not
/// here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionConfig {
    pub meta: FunctionMeta,
    pub spec: FunctionSpec,
}

impl FunctionConfig {
    /// Resolve and validate the identity fields.
    pub fn identity(&self) -> Result<FunctionIdentity, IdentityError> {
        self.meta.identity()
    }
}
