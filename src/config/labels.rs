// ABOUTME: Reserved container label keys applied to every function deploy.
// ABOUTME: Labels are the ground truth when the record store is lost.

/// Marks a container as managed by the local platform backend.
pub const PLATFORM: &str = "nuclio.io/platform";

/// Value of the [`PLATFORM`] label for this backend.
pub const PLATFORM_LOCAL: &str = "local";

/// Namespace of the owning function.
pub const NAMESPACE: &str = "nuclio.io/namespace";

/// Name of the owning function.
pub const FUNCTION_NAME: &str = "nuclio.io/function-name";

/// Full JSON-serialized function spec, for state reconstruction.
pub const FUNCTION_SPEC: &str = "nuclio.io/function-spec";

/// JSON-serialized annotations map; omitted when there are none.
pub const ANNOTATIONS: &str = "nuclio.io/annotations";

/// Project association for functions and function events.
pub const PROJECT_NAME: &str = "nuclio.io/project-name";

/// Returns true if `key` is a label key the platform itself writes on deploy.
///
/// `nuclio.io/project-name` is not in this set: it legitimately arrives
/// through user labels.
pub fn is_reserved(key: &str) -> bool {
    matches!(
        key,
        PLATFORM | NAMESPACE | FUNCTION_NAME | FUNCTION_SPEC | ANNOTATIONS
    )
}
