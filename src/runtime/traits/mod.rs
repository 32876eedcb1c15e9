// ABOUTME: Composable capability traits for container runtimes.
// ABOUTME: Defines ContainerOps, ImageOps, LogOps and their shared types.

mod container;
mod image;
mod logs;
pub(crate) mod sealed;
mod shared_types;

pub use container::{ContainerError, ContainerFilters, ContainerOps, ContainerSummary};
pub use image::{ImageError, ImageOps};
pub use logs::{LogError, LogOps};
pub use shared_types::*;

/// Everything the function lifecycle needs from a runtime.
///
/// Auto-implemented for any type that implements the required traits.
pub trait FunctionRuntime: ContainerOps + ImageOps + LogOps {}

impl<T> FunctionRuntime for T where T: ContainerOps + ImageOps + LogOps {}
