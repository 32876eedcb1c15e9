// ABOUTME: Function lifecycle orchestration using the type state pattern.
// ABOUTME: Exports the engine, state markers, and platform error types.

mod deployment;
mod engine;
mod error;
mod state;
mod transitions;

pub use deployment::Deployment;
pub use engine::{
    CreateFunctionOptions, CreateFunctionResult, GetFunctionsFilter, LifecycleEngine,
};
pub use error::{
    BuildErrorExt, ContainerErrorExt, ErrorKind, PlatformError, StoreErrorExt, WorkerErrorExt,
    format_error_chain,
};
pub use state::{Building, Built, Deployed, Ready, Validated};
pub use transitions::{FUNCTION_HTTP_PORT, PROCESSOR_CONFIG_MOUNT};
