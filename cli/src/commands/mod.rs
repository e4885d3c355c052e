// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the stackd CLI

pub mod config;
pub mod deploy;
pub mod webhook;

pub use self::config::ConfigCommand;

use anyhow::{Context, Result};
use std::path::PathBuf;

use stackd_core::domain::settings::{AgentConfig, AgentSettings};

/// Values given on the command line. They win over the settings file and
/// the environment.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub remote_url: Option<String>,
    pub branch: Option<String>,
    pub node: Option<String>,
}

impl SettingsOverrides {
    pub fn apply(&self, settings: &mut AgentSettings) {
        if let Some(remote_url) = &self.remote_url {
            settings.remote_url = Some(remote_url.clone());
        }
        if let Some(branch) = &self.branch {
            settings.branch = branch.clone();
        }
        if let Some(node) = &self.node {
            settings.node = Some(node.clone());
        }
    }
}

/// File, then environment, then flags.
pub fn load_settings(
    config_path: Option<PathBuf>,
    overrides: &SettingsOverrides,
) -> Result<AgentSettings> {
    let mut settings =
        AgentSettings::load_or_default(config_path).context("Failed to load settings")?;
    overrides.apply(&mut settings);
    Ok(settings)
}

/// Load and validate. A validation failure keeps its `DeployError` so the
/// binary can report each field.
pub fn resolve_config(
    config_path: Option<PathBuf>,
    overrides: &SettingsOverrides,
) -> Result<AgentConfig> {
    let settings = load_settings(config_path, overrides)?;
    Ok(settings.validate()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_settings() {
        let mut settings = AgentSettings::from_yaml_str(
            "remote_url: http://file/repo.git\nbranch: develop\nnode: from-file\n",
        )
        .unwrap();

        SettingsOverrides {
            remote_url: None,
            branch: Some("main".to_string()),
            node: Some("n1".to_string()),
        }
        .apply(&mut settings);

        assert_eq!(settings.remote_url.as_deref(), Some("http://file/repo.git"));
        assert_eq!(settings.branch, "main");
        assert_eq!(settings.node.as_deref(), Some("n1"));
    }

    #[test]
    fn test_empty_overrides_change_nothing() {
        let mut settings = AgentSettings::from_yaml_str("node: n1\n").unwrap();
        SettingsOverrides::default().apply(&mut settings);
        assert_eq!(settings.node.as_deref(), Some("n1"));
        assert_eq!(settings.branch, "main");
    }
}
