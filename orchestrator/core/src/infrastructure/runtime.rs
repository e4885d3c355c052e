// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::runtime::{ContainerEngine, InstanceId, LaunchSpec, RunningContainer, RuntimeError};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, StartContainerOptions,
};
use bollard::Docker;
use tracing::info;

/// Docker Engine API access over the runtime socket.
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    pub fn new(socket_path: Option<&str>) -> Result<Self, RuntimeError> {
        // Connect to Docker daemon (custom socket or auto-detect)
        let docker = if let Some(path) = socket_path {
            #[cfg(unix)]
            let result = Docker::connect_with_unix(path, 120, bollard::API_DEFAULT_VERSION);

            #[cfg(windows)]
            let result = Docker::connect_with_named_pipe(path, 120, bollard::API_DEFAULT_VERSION);

            result.map_err(|e| RuntimeError::ConnectionFailed(format!(
                "Failed to connect to Docker at {}: {}\n\n\
                 Ensure Docker is running and the socket is mounted into this container.",
                path, e
            )))?
        } else {
            Docker::connect_with_local_defaults().map_err(|e| {
                RuntimeError::ConnectionFailed(format!("Failed to connect to Docker: {}", e))
            })?
        };

        Ok(Self { docker })
    }

    /// Verify Docker daemon is accessible
    pub async fn healthcheck(&self) -> Result<(), RuntimeError> {
        self.docker
            .ping()
            .await
            .map_err(|e| RuntimeError::ConnectionFailed(format!(
                "Cannot reach Docker daemon: {}. Verify with: docker ps",
                e
            )))?;
        Ok(())
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn running_containers(&self) -> Result<Vec<RunningContainer>, RuntimeError> {
        let options = ListContainersOptions::<String> {
            all: false,
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| RuntimeError::ListFailed(e.to_string()))?;

        Ok(containers
            .into_iter()
            .map(|c| RunningContainer {
                id: c.id.unwrap_or_default(),
                names: c
                    .names
                    .unwrap_or_default()
                    .into_iter()
                    .map(|n| n.trim_start_matches('/').to_string())
                    .collect(),
                image: c.image.unwrap_or_default(),
            })
            .collect())
    }

    async fn launch(&self, spec: LaunchSpec) -> Result<InstanceId, RuntimeError> {
        let env: Vec<String> = spec
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();

        let host_config = bollard::service::HostConfig {
            binds: Some(spec.binds.clone()),
            ..Default::default()
        };

        let config = Config {
            image: Some(spec.image.clone()),
            env: Some(env),
            cmd: Some(spec.command.clone()),
            host_config: Some(host_config),
            ..Default::default()
        };

        let res = self
            .docker
            .create_container(None::<CreateContainerOptions<String>>, config)
            .await
            .map_err(|e| RuntimeError::LaunchFailed(e.to_string()))?;

        for warning in &res.warnings {
            tracing::warn!(container = %res.id, "Docker warning: {}", warning);
        }

        self.docker
            .start_container(&res.id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| RuntimeError::LaunchFailed(format!("Failed to start container: {}", e)))?;

        info!(container = %res.id, image = %spec.image, "Started detached container");
        Ok(InstanceId::new(res.id))
    }
}
