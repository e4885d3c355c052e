// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Agent Settings
//
// Layered configuration for a stackd node:
// - optional YAML file (explicit path or discovery)
// - STACKD_* environment variables
// - CLI flags (applied by the binary)
//
// `AgentSettings` is the raw, possibly incomplete layer. `validate()` turns it
// into an `AgentConfig` in which every required value is present, or reports
// every missing/invalid field at once.

use crate::domain::error::{DeployError, FieldIssue, FieldIssueKind};
use crate::domain::manifest::NodeIdentity;
use crate::domain::webhook::WebhookToken;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "STACKD_CONFIG_PATH";
pub const ENV_REMOTE_URL: &str = "STACKD_REMOTE_URL";
pub const ENV_BRANCH: &str = "STACKD_BRANCH";
pub const ENV_NODE: &str = "STACKD_NODE";
pub const ENV_WEBHOOK_IDS: &str = "STACKD_WEBHOOK_IDS";
pub const ENV_SELF_IMAGE: &str = "STACKD_SELF_IMAGE";
pub const ENV_WORK_DIR: &str = "STACKD_WORK_DIR";
pub const ENV_DOCKER_SOCKET: &str = "STACKD_DOCKER_SOCKET";

/// Connection parameters handed to every reconciliation cycle and passed
/// unchanged to a duplicated instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub remote_url: String,
    pub branch: String,
    pub node: NodeIdentity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// URL of the stack-configuration repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    /// Branch to track
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Node identity to deploy for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,

    /// Tokens accepted on POST /webhook/{token}
    #[serde(default)]
    pub webhook_ids: Vec<String>,

    /// Where the working copy lives (default: <tmp>/stackd)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,

    /// Image to relaunch when duplicating; discovered from the running
    /// container when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_image: Option<String>,

    /// Container runtime socket, also bind-mounted into duplicates
    #[serde(default = "default_docker_socket")]
    pub docker_socket: String,

    /// Program (and leading args) used to run compose
    #[serde(default = "default_compose_command")]
    pub compose_command: Vec<String>,

    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Network bind address for the webhook listener
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Prometheus exporter port; disabled when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
            metrics_port: None,
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            remote_url: None,
            branch: default_branch(),
            node: None,
            webhook_ids: vec![],
            work_dir: None,
            self_image: None,
            docker_socket: default_docker_socket(),
            compose_command: default_compose_command(),
            api: ApiConfig::default(),
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub connection: ConnectionParameters,
    pub webhook_tokens: Vec<WebhookToken>,
    pub work_dir: PathBuf,
    pub self_image: Option<String>,
    pub docker_socket: String,
    pub compose_command: Vec<String>,
    pub api: ApiConfig,
}

impl AgentSettings {
    /// Load settings from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse settings from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let settings = serde_yaml::from_str(yaml)?;
        Ok(settings)
    }

    /// Discover a settings file using precedence order
    /// 1. STACKD_CONFIG_PATH environment variable
    /// 2. ./stackd-config.yaml (working directory)
    /// 3. ~/.stackd/config.yaml (user home)
    /// 4. /etc/stackd/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./stackd-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".stackd").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/stackd/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load settings with discovery, falling back to defaults. Environment
    /// overrides are applied in every case.
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut settings = if let Some(path) = cli_path {
            tracing::info!("Loading settings from explicit path: {:?}", path);
            Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load settings at {:?}: {}", path, e)
            })?
        } else if let Some(path) = Self::discover_config() {
            tracing::info!("Loading settings from discovered path: {:?}", path);
            Self::from_yaml_file(path)?
        } else {
            tracing::debug!("No settings file found, using defaults and environment");
            Self::default()
        };

        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Apply STACKD_* environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Empty values are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(val) = get(ENV_REMOTE_URL) {
            self.remote_url = Some(val);
        }
        if let Some(val) = get(ENV_BRANCH) {
            self.branch = val;
        }
        if let Some(val) = get(ENV_NODE) {
            self.node = Some(val);
        }
        if let Some(val) = get(ENV_WEBHOOK_IDS) {
            self.webhook_ids = val
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(val) = get(ENV_SELF_IMAGE) {
            self.self_image = Some(val);
        }
        if let Some(val) = get(ENV_WORK_DIR) {
            self.work_dir = Some(PathBuf::from(val));
        }
        if let Some(val) = get(ENV_DOCKER_SOCKET) {
            self.docker_socket = val;
        }
    }

    /// Check every field and build the resolved configuration.
    pub fn validate(&self) -> Result<AgentConfig, DeployError> {
        let mut issues = Vec::new();

        let remote_url = required(&self.remote_url, "remote_url", &mut issues);
        let node = required(&self.node, "node", &mut issues);

        if self.branch.trim().is_empty() {
            issues.push(invalid("branch", "cannot be empty"));
        }

        let mut webhook_tokens = Vec::with_capacity(self.webhook_ids.len());
        for (i, id) in self.webhook_ids.iter().enumerate() {
            match WebhookToken::parse(id) {
                Ok(token) => webhook_tokens.push(token),
                Err(reason) => issues.push(invalid(&format!("webhook_ids[{}]", i), &reason)),
            }
        }

        if self.compose_command.is_empty() || self.compose_command[0].trim().is_empty() {
            issues.push(invalid("compose_command", "must name a program"));
        }

        if self.docker_socket.trim().is_empty() {
            issues.push(invalid("docker_socket", "cannot be empty"));
        }

        match (remote_url, node) {
            (Some(remote_url), Some(node)) if issues.is_empty() => Ok(AgentConfig {
                connection: ConnectionParameters {
                    remote_url,
                    branch: self.branch.clone(),
                    node: NodeIdentity::new(node),
                },
                webhook_tokens,
                work_dir: self
                    .work_dir
                    .clone()
                    .unwrap_or_else(|| std::env::temp_dir().join("stackd")),
                self_image: self.self_image.clone(),
                docker_socket: self.docker_socket.clone(),
                compose_command: self.compose_command.clone(),
                api: self.api.clone(),
            }),
            _ => Err(DeployError::ConfigValidation { fields: issues }),
        }
    }
}

fn required(value: &Option<String>, field: &str, issues: &mut Vec<FieldIssue>) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            issues.push(FieldIssue {
                field: field.to_string(),
                kind: FieldIssueKind::Missing,
            });
            None
        }
    }
}

fn invalid(field: &str, reason: &str) -> FieldIssue {
    FieldIssue {
        field: field.to_string(),
        kind: FieldIssueKind::Invalid(reason.to_string()),
    }
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_docker_socket() -> String {
    "/var/run/docker.sock".to_string()
}

fn default_compose_command() -> Vec<String> {
    vec!["docker".to_string(), "compose".to_string()]
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8000
}
