// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: Validation is the only entry point into the state machine.

use crate::config::{FunctionConfig, FunctionIdentity};

use super::error::PlatformError;
use super::state::{Ready, Validated};

/// A function deploy in progress, parameterized by its current state.
///
/// The state type parameter `S` carries state-specific data (previous port,
/// built image, container ID) directly in the state type, so a step cannot
/// run before the data it needs exists.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) config: FunctionConfig,
    pub(crate) identity: FunctionIdentity,
    pub(crate) state: S,
}

impl Deployment<Validated> {
    /// Validate a function config into the initial deploy state.
    ///
    /// Rejects configs with missing or malformed identity fields and strips
    /// registry fields, which are meaningless on the local backend. No state
    /// is mutated on failure.
    pub fn validate(mut config: FunctionConfig) -> Result<Self, PlatformError> {
        let identity = config
            .identity()
            .map_err(|e| PlatformError::validation(e.to_string()))?;

        // The local backend has no registry; these fields must not leak
        // into the function-spec label
        let stripped_run = config.spec.run_registry.take().is_some();
        let stripped_build = config.spec.build.registry.take().is_some();
        if stripped_run || stripped_build {
            tracing::debug!(function = %identity, "Stripped registry fields from spec");
        }

        Ok(Deployment {
            config,
            identity,
            state: Validated,
        })
    }
}

impl<S> Deployment<S> {
    pub fn identity(&self) -> &FunctionIdentity {
        &self.identity
    }

    pub fn config(&self) -> &FunctionConfig {
        &self.config
    }

    /// Deterministic container name for this deploy.
    pub fn container_name(&self) -> String {
        self.identity.container_name()
    }

    /// Internal helper to move into a new state.
    pub(crate) fn transition<T>(self, state: T) -> Deployment<T> {
        Deployment {
            config: self.config,
            identity: self.identity,
            state,
        }
    }
}

impl Deployment<Ready> {
    /// Consume the deployment, returning the config and terminal state.
    pub fn finish(self) -> (FunctionConfig, Ready) {
        (self.config, self.state)
    }
}
