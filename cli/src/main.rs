// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # stackd
//!
//! Keeps the compose stacks of one node in step with a git repository,
//! including the stack stackd itself runs in.
//!
//! ## Commands
//!
//! - `stackd deploy` - sync, reconcile every stack for this node, hand the
//!   self-managing stack over to a fresh duplicate
//! - `stackd bootstrap` - sync and reconcile only the self-managing stack
//! - `stackd api` - serve `POST /webhook/{token}` to trigger deploys
//! - `stackd new-webhook` - generate a webhook token
//! - `stackd config show|validate` - inspect resolved settings

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use stackd_cli::commands::{self, ConfigCommand, SettingsOverrides};
use stackd_cli::daemon;
use stackd_cli::exit::report_error;
use stackd_core::domain::cycle::CycleMode;

/// stackd - self-hosting continuous deployment for compose stacks
#[derive(Parser)]
#[command(name = "stackd")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to settings file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "STACKD_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// URL of the stack repository
    #[arg(long, global = true, env = "STACKD_REMOTE_URL", value_name = "URL")]
    remote_url: Option<String>,

    /// Branch to track (default: main)
    #[arg(long, global = true, env = "STACKD_BRANCH")]
    branch: Option<String>,

    /// Node identity to deploy for
    #[arg(long, global = true, env = "STACKD_NODE")]
    node: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "STACKD_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile every stack for this node, then duplicate self
    #[command(name = "deploy")]
    Deploy,

    /// Reconcile only the self-managing stack
    #[command(name = "bootstrap")]
    Bootstrap,

    /// Serve the webhook API
    #[command(name = "api")]
    Api {
        /// Bind address (default: api.bind_address from settings)
        #[arg(long)]
        host: Option<String>,

        /// Port (default: api.port from settings)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Generate a webhook token
    #[command(name = "new-webhook")]
    NewWebhook,

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_level) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    if let Err(err) = run(cli).await {
        std::process::exit(report_error(&err));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let overrides = SettingsOverrides {
        remote_url: cli.remote_url,
        branch: cli.branch,
        node: cli.node,
    };

    match cli.command {
        Commands::Deploy => {
            let config = commands::resolve_config(cli.config, &overrides)?;
            info!("Starting deploy");
            commands::deploy::run(CycleMode::Deploy, config).await
        }
        Commands::Bootstrap => {
            let config = commands::resolve_config(cli.config, &overrides)?;
            info!("Starting bootstrap");
            commands::deploy::run(CycleMode::Bootstrap, config).await
        }
        Commands::Api { host, port } => {
            let config = commands::resolve_config(cli.config, &overrides)?;
            daemon::start_api(config, host, port).await
        }
        Commands::NewWebhook => commands::webhook::new_webhook(),
        Commands::Config { command } => {
            commands::config::handle_command(command, cli.config, &overrides)
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
