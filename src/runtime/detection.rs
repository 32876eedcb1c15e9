// ABOUTME: Runtime detection for the local system.
// ABOUTME: Walks candidate sockets, Podman before Docker.

use super::types::{RuntimeInfo, RuntimeType};
use std::path::Path;

/// Error during runtime detection.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container runtime found (checked Podman and Docker sockets)")]
    NoRuntimeFound,
}

/// Detect the container runtime on the local system.
///
/// The first candidate socket that exists wins: rootless Podman, rootful
/// Podman, then Docker.
pub fn detect_local() -> Result<RuntimeInfo, DetectionError> {
    candidate_sockets()
        .into_iter()
        .find(|(_, socket_path)| Path::new(socket_path).exists())
        .map(|(runtime_type, socket_path)| RuntimeInfo {
            runtime_type,
            socket_path,
        })
        .ok_or(DetectionError::NoRuntimeFound)
}

fn candidate_sockets() -> Vec<(RuntimeType, String)> {
    let mut candidates = Vec::new();
    if let Some(uid) = current_uid() {
        candidates.push((
            RuntimeType::Podman,
            format!("/run/user/{uid}/podman/podman.sock"),
        ));
    }
    candidates.push((RuntimeType::Podman, "/run/podman/podman.sock".to_string()));
    candidates.push((RuntimeType::Docker, "/var/run/docker.sock".to_string()));
    candidates
}

fn current_uid() -> Option<String> {
    if let Ok(uid) = std::env::var("UID") {
        return Some(uid);
    }
    // Shells don't always export UID; /proc has it either way
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let uid_line = status.lines().find(|line| line.starts_with("Uid:"))?;
    uid_line.split_whitespace().nth(1).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn podman_is_preferred_over_docker() {
        let candidates = candidate_sockets();
        assert!(candidates.len() >= 2);
        assert_eq!(candidates.first().unwrap().0, RuntimeType::Podman);
        assert_eq!(candidates.last().unwrap().0, RuntimeType::Docker);
        assert_eq!(candidates.last().unwrap().1, "/var/run/docker.sock");
    }
}
