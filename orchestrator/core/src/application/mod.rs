// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod deployment;
pub mod duplicator;
pub mod node_config;

pub use deployment::DeploymentOrchestrator;
pub use duplicator::SelfBootstrapDuplicator;
pub use node_config::NodeConfigResolver;
