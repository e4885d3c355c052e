// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Self-Bootstrap Duplicator
//!
//! The agent runs inside the very stack it manages, so it cannot recreate
//! that stack in place. Instead it starts a fresh copy of its own image in
//! `bootstrap` mode. The copy reconciles the self-managing stack, and that
//! `down`/`up` is what removes the old container. The old instance is never
//! stopped here, which leaves an overlap window instead of a gap with no
//! agent running.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::domain::error::DeployError;
use crate::domain::runtime::{docker_host, ContainerEngine, InstanceId, LaunchSpec, DOCKER_HOST_VAR};
use crate::domain::settings::{
    ConnectionParameters, ENV_BRANCH, ENV_DOCKER_SOCKET, ENV_NODE, ENV_REMOTE_URL,
};

/// Command given to the duplicate.
pub const BOOTSTRAP_COMMAND: &str = "bootstrap";

pub struct SelfBootstrapDuplicator {
    engine: Arc<dyn ContainerEngine>,
    docker_socket: String,
    self_image: Option<String>,
    host: String,
}

impl SelfBootstrapDuplicator {
    pub fn new(engine: Arc<dyn ContainerEngine>, docker_socket: impl Into<String>) -> Self {
        let host = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_default();

        Self {
            engine,
            docker_socket: docker_socket.into(),
            self_image: None,
            host,
        }
    }

    /// Relaunch this image instead of looking it up from the running container.
    pub fn with_self_image(mut self, image: Option<String>) -> Self {
        self.self_image = image.filter(|i| !i.trim().is_empty());
        self
    }

    /// Override the host identifier used to find our own container.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Image reference of the running agent.
    pub async fn resolve_image(&self) -> Result<String, DeployError> {
        if let Some(image) = &self.self_image {
            return Ok(image.clone());
        }

        let containers = self.engine.running_containers().await.map_err(|e| {
            DeployError::Duplication {
                image: "<unresolved>".to_string(),
                reason: e.to_string(),
            }
        })?;

        containers
            .into_iter()
            .find(|c| c.is_host(&self.host))
            .map(|c| c.image)
            .filter(|image| !image.is_empty())
            .ok_or_else(|| DeployError::SelfNotFound(self.host.clone()))
    }

    /// Launch parameters for a duplicate of `image`.
    pub fn launch_spec(&self, image: &str, params: &ConnectionParameters) -> LaunchSpec {
        let env = BTreeMap::from([
            (ENV_REMOTE_URL.to_string(), params.remote_url.clone()),
            (ENV_BRANCH.to_string(), params.branch.clone()),
            (ENV_NODE.to_string(), params.node.as_str().to_string()),
            (ENV_DOCKER_SOCKET.to_string(), self.docker_socket.clone()),
            (DOCKER_HOST_VAR.to_string(), docker_host(&self.docker_socket)),
        ]);

        LaunchSpec {
            image: image.to_string(),
            env,
            binds: vec![format!("{0}:{0}", self.docker_socket)],
            command: vec![BOOTSTRAP_COMMAND.to_string()],
        }
    }

    /// Start a new instance of ourselves that will take over the self stack.
    pub async fn duplicate_self(
        &self,
        params: &ConnectionParameters,
    ) -> Result<InstanceId, DeployError> {
        let image = self.resolve_image().await?;
        let spec = self.launch_spec(&image, params);

        info!(image = %image, node = %params.node, branch = %params.branch, "Duplicating self");

        let id = self
            .engine
            .launch(spec)
            .await
            .map_err(|e| DeployError::Duplication {
                image: image.clone(),
                reason: e.to_string(),
            })?;

        info!(container = %id, "Duplicate started, it will take over the self-managing stack");
        Ok(id)
    }
}
