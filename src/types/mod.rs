// ABOUTME: Identifier newtypes and validated domain types.
// ABOUTME: Distinct ID types and RFC 1123 name validation.

mod function_name;
mod id;
mod image_ref;
mod namespace;

pub use function_name::{FunctionName, FunctionNameError};
pub use id::{ContainerId, EventId};
pub use image_ref::{ImageRef, ParseImageRefError};
pub use namespace::{DEFAULT_NAMESPACE, Namespace, NamespaceError, SELF_NAMESPACE_SENTINEL};
