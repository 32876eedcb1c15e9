// ABOUTME: Identifier newtypes for containers and function events.
// ABOUTME: Distinct types keep the two ID spaces from crossing wires.

use serde::{Deserialize, Serialize};

/// Declares a string-backed identifier type.
///
/// Each ID serializes as a plain string but is a distinct type, so a
/// container ID cannot be handed to an API expecting an event ID.
macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_type! {
    /// Runtime-assigned ID (or name) of a container.
    ContainerId
}

id_type! {
    /// Caller-assigned ID of a saved function event.
    EventId
}
