// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A container currently running on this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningContainer {
    pub id: String,
    /// Names without the leading `/` the Docker API adds
    pub names: Vec<String>,
    pub image: String,
}

impl RunningContainer {
    /// Whether this container is the one whose hostname is `host`.
    ///
    /// Docker sets a container's hostname to its 12-character short id
    /// unless told otherwise, so a prefix match on the id is accepted as
    /// well as an exact name match.
    pub fn is_host(&self, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }
        self.id.starts_with(host) || self.names.iter().any(|n| n == host)
    }
}

/// Everything needed to start a new detached container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub image: String,
    pub env: BTreeMap<String, String>,
    /// `host:container` bind mounts
    pub binds: Vec<String>,
    pub command: Vec<String>,
}

/// Environment variable the docker CLI and compose read the daemon address from.
pub const DOCKER_HOST_VAR: &str = "DOCKER_HOST";

/// `DOCKER_HOST` value for a socket path. Values that already carry a
/// scheme (`unix://`, `tcp://`, `npipe://`) pass through unchanged.
pub fn docker_host(socket: &str) -> String {
    if socket.contains("://") {
        socket.to_string()
    } else {
        format!("unix://{}", socket)
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Failed to connect to container runtime: {0}")]
    ConnectionFailed(String),
    #[error("Failed to list containers: {0}")]
    ListFailed(String),
    #[error("Failed to launch container: {0}")]
    LaunchFailed(String),
}

#[async_trait]
pub trait ContainerEngine: Send + Sync {
    async fn running_containers(&self) -> Result<Vec<RunningContainer>, RuntimeError>;
    async fn launch(&self, spec: LaunchSpec) -> Result<InstanceId, RuntimeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_matches_short_id_or_name() {
        let container = RunningContainer {
            id: "3f4e8a9b1c2d5e6f7a8b9c0d".to_string(),
            names: vec!["stackd-stackd-1".to_string()],
            image: "ghcr.io/example/stackd:latest".to_string(),
        };
        assert!(container.is_host("3f4e8a9b1c2d"));
        assert!(container.is_host("stackd-stackd-1"));
        assert!(!container.is_host("stackd"));
        assert!(!container.is_host("9f4e8a9b1c2d"));
        assert!(!container.is_host(""));
    }

    #[test]
    fn test_docker_host_from_socket() {
        assert_eq!(docker_host("/run/docker.sock"), "unix:///run/docker.sock");
        assert_eq!(docker_host("unix:///run/docker.sock"), "unix:///run/docker.sock");
        assert_eq!(docker_host("tcp://10.0.0.2:2375"), "tcp://10.0.0.2:2375");
    }
}
