// ABOUTME: Desired function spec: image, env, volumes, ports, readiness.
// ABOUTME: Registry fields exist on the wire but are stripped by this backend.

use crate::types::ImageRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Desired state of a function.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSpec {
    /// Image to run. Optional because a builder may produce it; the prebuilt
    /// builder requires it.
    #[serde(default)]
    pub image: Option<ImageRef>,

    #[serde(default)]
    pub env: HashMap<String, String>,

    #[serde(default)]
    pub volumes: Vec<VolumeSpec>,

    /// Desired host HTTP port. When unset, the previously bound port is
    /// reused across redeploys, falling back to an ephemeral port.
    #[serde(default)]
    pub http_port: Option<u16>,

    /// How long to wait for the deployed container to report healthy.
    #[serde(
        default = "default_readiness_timeout",
        with = "humantime_serde"
    )]
    pub readiness_timeout: Duration,

    /// Container network to attach to.
    #[serde(default)]
    pub network: Option<String>,

    /// Registry used to run the image. Meaningless on the local backend;
    /// stripped during validation.
    #[serde(default)]
    pub run_registry: Option<String>,

    #[serde(default)]
    pub build: BuildSpec,
}

pub fn default_readiness_timeout() -> Duration {
    Duration::from_secs(60)
}

impl Default for FunctionSpec {
    fn default() -> Self {
        Self {
            image: None,
            env: HashMap::new(),
            volumes: Vec::new(),
            http_port: None,
            readiness_timeout: default_readiness_timeout(),
            network: None,
            run_registry: None,
            build: BuildSpec::default(),
        }
    }
}

/// A host-path bind mount into the function container.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSpec {
    pub host_path: String,
    pub mount_path: String,
}

/// Build inputs handed opaquely to the image builder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSpec {
    /// Registry to push built images to. Stripped on the local backend.
    #[serde(default)]
    pub registry: Option<String>,

    /// Local image archive to load instead of pulling.
    #[serde(default)]
    pub image_archive: Option<PathBuf>,

    #[serde(default)]
    pub args: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readiness_timeout_defaults_to_sixty_seconds() {
        let spec: FunctionSpec = serde_yaml::from_str("image: echo:1").unwrap();
        assert_eq!(spec.readiness_timeout, Duration::from_secs(60));
        assert_eq!(spec.image.unwrap().to_string(), "echo:1");
    }

    #[test]
    fn readiness_timeout_parses_humantime() {
        let spec: FunctionSpec =
            serde_yaml::from_str("image: echo:1\nreadinessTimeout: 10s").unwrap();
        assert_eq!(spec.readiness_timeout, Duration::from_secs(10));
    }
}
