// ABOUTME: Shared types used across runtime trait definitions.
// ABOUTME: RunConfig, ContainerInfo, port bindings, health states.

use crate::types::{ContainerId, ImageRef};
use std::collections::HashMap;

/// Configuration for running (create + start) a container.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Name for the container.
    pub name: String,
    /// Image to run.
    pub image: ImageRef,
    /// Environment variables.
    pub env: HashMap<String, String>,
    /// Labels to apply.
    pub labels: HashMap<String, String>,
    /// TCP port mappings (host to container).
    pub ports: Vec<PortMapping>,
    /// Bind mounts.
    pub volumes: Vec<VolumeMount>,
    /// Network to attach to.
    pub network: Option<String>,
}

/// A host-to-container TCP port mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub host_port: u16,
    pub container_port: u16,
}

/// A bind mount into the container.
#[derive(Debug, Clone)]
pub struct VolumeMount {
    /// Host path or volume name.
    pub source: String,
    /// Target path in the container.
    pub target: String,
    pub read_only: bool,
}

/// One host-side binding for an exposed container port.
#[derive(Debug, Clone, Default)]
pub struct PortBinding {
    pub host_ip: Option<String>,
    pub host_port: Option<u16>,
}

/// Keys the port-binding maps by `<containerPort>/<proto>`, e.g. `8080/tcp`.
pub type PortBindings = HashMap<String, Vec<PortBinding>>;

/// Detailed information about a container.
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    pub state: ContainerState,
    /// Health status, if the image configures a healthcheck.
    pub health: Option<HealthState>,
    pub labels: HashMap<String, String>,
    pub port_bindings: PortBindings,
}

/// Container state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
}

/// Health state of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Starting,
    Healthy,
    Unhealthy,
    None,
}

/// Read the first host port bound for `<container_port>/tcp`.
pub fn bound_host_port(bindings: &PortBindings, container_port: u16) -> Option<u16> {
    bindings
        .get(&format!("{}/tcp", container_port))
        .and_then(|b| b.first())
        .and_then(|b| b.host_port)
}
