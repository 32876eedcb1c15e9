// ABOUTME: Platform error type using SNAFU with the ErrorKind pattern.
// ABOUTME: Opaque error with kind() accessor; leaf sources stay inspectable.

use snafu::Snafu;
use std::error::Error;

use crate::builder::BuildError;
use crate::runtime::ContainerError;
use crate::store::StoreError;
use crate::worker::WorkerError;

/// Categories of platform errors.
///
/// Use `PlatformError::kind()` to get this value for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed input; no state was mutated.
    Validation,
    /// Identity not present; deletes are idempotent, gets return empty.
    NotFound,
    /// An upsert lost a race; the caller may retry.
    Conflict,
    /// The external builder signalled an error; state=Error was recorded.
    BuildFailed,
    /// Container run or readiness failure; the failing container is kept.
    DeployFailed,
    /// Runtime adapter error not attributable to user input.
    Runtime,
    /// Worker allocation timed out.
    NoAvailableWorkers,
    /// A generic wait exceeded its deadline.
    Timeout,
}

/// Errors surfaced by the lifecycle engine and platform facade.
///
/// This is an opaque error type. Use `kind()` to determine the category and
/// `source()` to inspect the wrapped leaf error.
#[derive(Debug)]
pub struct PlatformError(InnerPlatformError);

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for PlatformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl PlatformError {
    /// Returns the kind of this error for programmatic handling.
    pub fn kind(&self) -> ErrorKind {
        match &self.0 {
            InnerPlatformError::ValidationFailed { .. } => ErrorKind::Validation,
            InnerPlatformError::RecordNotFound { .. } => ErrorKind::NotFound,
            InnerPlatformError::Conflict { .. } => ErrorKind::Conflict,
            InnerPlatformError::BuildFailed { .. } => ErrorKind::BuildFailed,
            InnerPlatformError::RunFailed { .. }
            | InnerPlatformError::ReadinessFailed { .. }
            | InnerPlatformError::DeployFailed { .. } => ErrorKind::DeployFailed,
            InnerPlatformError::RuntimeFailed { .. }
            | InnerPlatformError::RuntimeFailedMsg { .. }
            | InnerPlatformError::StoreFailed { .. } => ErrorKind::Runtime,
            InnerPlatformError::WorkersExhausted { .. } => ErrorKind::NoAvailableWorkers,
            InnerPlatformError::WaitTimedOut { .. } => ErrorKind::Timeout,
        }
    }
}

/// Internal error type with full context - not exposed in the public API.
#[derive(Debug, Snafu)]
enum InnerPlatformError {
    #[snafu(display("validation failed: {message}"))]
    ValidationFailed { message: String },

    #[snafu(display("{what} not found"))]
    RecordNotFound { what: String },

    #[snafu(display("conflict: {message}"))]
    Conflict { message: String },

    #[snafu(display("failed to build function image: {source}"))]
    BuildFailed { source: BuildError },

    #[snafu(display("failed to run function container: {source}"))]
    RunFailed { source: ContainerError },

    #[snafu(display("function did not become ready: {message}"))]
    ReadinessFailed { message: String },

    #[snafu(display("deploy failed: {message}"))]
    DeployFailed { message: String },

    #[snafu(display("container runtime error: {source}"))]
    RuntimeFailed { source: ContainerError },

    #[snafu(display("container runtime error: {message}"))]
    RuntimeFailedMsg { message: String },

    #[snafu(display("record store error: {source}"))]
    StoreFailed { source: StoreError },

    #[snafu(display("worker allocation failed: {source}"))]
    WorkersExhausted { source: WorkerError },

    #[snafu(display("timed out: {message}"))]
    WaitTimedOut { message: String },
}

// Context selectors for converting leaf errors at call sites
use snafu::ResultExt;

pub trait ContainerErrorExt<T> {
    /// Failure while running the function container (DeployFailed).
    fn context_run(self) -> Result<T, PlatformError>;
    /// Runtime adapter failure outside the run step (Runtime).
    fn context_runtime(self) -> Result<T, PlatformError>;
}

impl<T> ContainerErrorExt<T> for Result<T, ContainerError> {
    fn context_run(self) -> Result<T, PlatformError> {
        self.context(RunFailedSnafu).map_err(PlatformError)
    }

    fn context_runtime(self) -> Result<T, PlatformError> {
        self.context(RuntimeFailedSnafu).map_err(PlatformError)
    }
}

pub trait BuildErrorExt<T> {
    fn context_build(self) -> Result<T, PlatformError>;
}

impl<T> BuildErrorExt<T> for Result<T, BuildError> {
    fn context_build(self) -> Result<T, PlatformError> {
        self.context(BuildFailedSnafu).map_err(PlatformError)
    }
}

pub trait StoreErrorExt<T> {
    /// Store failure, mapping missing records onto the NotFound kind.
    fn context_store(self) -> Result<T, PlatformError>;
}

impl<T> StoreErrorExt<T> for Result<T, StoreError> {
    fn context_store(self) -> Result<T, PlatformError> {
        self.map_err(|e| match e {
            StoreError::NotFound(what) => PlatformError::not_found(what),
            StoreError::Conflict(message) => PlatformError::conflict(message),
            other => PlatformError(InnerPlatformError::StoreFailed { source: other }),
        })
    }
}

pub trait WorkerErrorExt<T> {
    fn context_workers(self) -> Result<T, PlatformError>;
}

impl<T> WorkerErrorExt<T> for Result<T, WorkerError> {
    fn context_workers(self) -> Result<T, PlatformError> {
        self.context(WorkersExhaustedSnafu).map_err(PlatformError)
    }
}

// Factory functions for errors without a source
impl PlatformError {
    pub fn validation(message: impl Into<String>) -> Self {
        PlatformError(InnerPlatformError::ValidationFailed {
            message: message.into(),
        })
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        PlatformError(InnerPlatformError::RecordNotFound { what: what.into() })
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PlatformError(InnerPlatformError::Conflict {
            message: message.into(),
        })
    }

    pub fn readiness_failed(message: impl Into<String>) -> Self {
        PlatformError(InnerPlatformError::ReadinessFailed {
            message: message.into(),
        })
    }

    pub fn deploy_failed(message: impl Into<String>) -> Self {
        PlatformError(InnerPlatformError::DeployFailed {
            message: message.into(),
        })
    }

    pub fn runtime_error(message: impl Into<String>) -> Self {
        PlatformError(InnerPlatformError::RuntimeFailedMsg {
            message: message.into(),
        })
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        PlatformError(InnerPlatformError::WaitTimedOut {
            message: message.into(),
        })
    }
}

/// Format an error and its full source chain, one cause per line.
pub fn format_error_chain(error: &dyn Error) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        out.push_str("\ncaused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
