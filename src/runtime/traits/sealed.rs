// ABOUTME: Sealed trait pattern for runtime traits.
// ABOUTME: Prevents external implementations, allowing non-breaking evolution.

/// Sealed trait to prevent external implementations.
///
/// Only our internal runtime types can implement the capability traits,
/// which lets us add methods without breaking semver.
pub trait Sealed {}
