// ABOUTME: Container runtime detection and trait abstractions.
// ABOUTME: Auto-detects the local runtime, defines composable capability traits.

mod bollard;
mod detection;
mod stub;
pub mod traits;
mod types;

pub use bollard::BollardRuntime;
pub use detection::{DetectionError, detect_local};
pub use stub::StubRuntime;
pub use types::{RuntimeInfo, RuntimeType};

// Re-export traits at runtime level for convenience
pub use traits::{
    ContainerError, ContainerFilters, ContainerInfo, ContainerOps, ContainerState,
    ContainerSummary, FunctionRuntime, HealthState, ImageError, ImageOps, LogError, LogOps,
    PortBinding, PortBindings, PortMapping, RunConfig, VolumeMount, bound_host_port,
};
