// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use stackd_core::domain::settings::{AgentSettings, ENV_CONFIG_PATH};

use super::{load_settings, SettingsOverrides};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the resolved settings
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate settings
    Validate {
        /// Path to settings file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

pub fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
    overrides: &SettingsOverrides,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, overrides, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override), overrides),
    }
}

fn show(
    config_override: Option<PathBuf>,
    overrides: &SettingsOverrides,
    show_paths: bool,
) -> Result<()> {
    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. {}: {}",
            ENV_CONFIG_PATH,
            std::env::var(ENV_CONFIG_PATH)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./stackd-config.yaml");
        println!("  4. ~/.stackd/config.yaml");
        println!("  5. /etc/stackd/config.yaml");
        println!();
    }

    let settings = redacted(load_settings(config_override, overrides)?);
    let yaml = serde_yaml::to_string(&settings).context("Failed to render settings")?;

    println!("{}", "Current configuration:".bold());
    println!();
    print!("{}", yaml);

    Ok(())
}

fn validate(config_path: Option<PathBuf>, overrides: &SettingsOverrides) -> Result<()> {
    println!("Validating configuration...");

    let config = load_settings(config_path, overrides)?.validate()?;

    println!("{}", "✓ Configuration is valid".green());
    println!("  Node: {}", config.connection.node);
    println!("  Repository: {} ({})", config.connection.remote_url, config.connection.branch);
    println!("  Working copy: {}", config.work_dir.display());
    if config.webhook_tokens.is_empty() {
        println!("  {}", "No webhook ids configured, the api command will reject every call".yellow());
    }

    Ok(())
}

/// Webhook ids are credentials.
fn redacted(mut settings: AgentSettings) -> AgentSettings {
    settings.webhook_ids = settings
        .webhook_ids
        .iter()
        .map(|id| {
            let visible: String = id.chars().take(4).collect();
            format!("{}…", visible)
        })
        .collect();
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_ids_are_redacted() {
        let settings =
            AgentSettings::from_yaml_str("webhook_ids: [abcdefgh1234, xy]\n").unwrap();
        assert_eq!(redacted(settings).webhook_ids, vec!["abcd…", "xy…"]);
    }
}
