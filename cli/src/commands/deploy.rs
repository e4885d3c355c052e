// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! One-shot `deploy` and `bootstrap` commands

use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;

use stackd_core::application::{DeploymentOrchestrator, SelfBootstrapDuplicator};
use stackd_core::domain::cycle::{CycleMode, CycleReport};
use stackd_core::domain::settings::AgentConfig;
use stackd_core::infrastructure::compose::ComposeStackManager;
use stackd_core::infrastructure::git::GitSynchronizer;
use stackd_core::infrastructure::runtime::DockerEngine;

/// Wire the production adapters into an orchestrator.
pub fn build_orchestrator(config: &AgentConfig) -> Result<DeploymentOrchestrator> {
    let engine = DockerEngine::new(Some(&config.docker_socket))
        .context("Failed to set up container runtime client")?;

    let duplicator = SelfBootstrapDuplicator::new(Arc::new(engine), config.docker_socket.clone())
        .with_self_image(config.self_image.clone());

    Ok(DeploymentOrchestrator::new(
        Arc::new(GitSynchronizer::new()),
        Arc::new(
            ComposeStackManager::new(config.compose_command.clone())
                .with_docker_socket(&config.docker_socket),
        ),
        duplicator,
        config.work_dir.clone(),
    ))
}

pub async fn run(mode: CycleMode, config: AgentConfig) -> Result<()> {
    let orchestrator = build_orchestrator(&config)?;

    let report = match mode {
        CycleMode::Deploy => orchestrator.deploy(&config.connection).await?,
        CycleMode::Bootstrap => orchestrator.bootstrap(&config.connection).await?,
    };

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &CycleReport) {
    if report.attempted() == 0 && report.duplicate.is_none() {
        println!("{}", "✓ Nothing to do for this node".green());
        return;
    }

    for stack in &report.reconciled {
        println!("  {} {}", "✓".green(), stack);
    }
    if let Some(id) = &report.duplicate {
        println!("  {} handed over to {}", "→".cyan(), id);
    }
    println!(
        "{}",
        format!("✓ {} finished ({})", report.mode.as_str(), report.id).green()
    );
}
