// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Deployment Orchestrator
//!
//! Drives one reconciliation cycle: sync the stack repository, resolve this
//! node's entry, then reconcile stacks.
//!
//! - `deploy` reconciles every workload stack in manifest order, then hands
//!   the self-managing stack over to a fresh duplicate of the agent.
//! - `bootstrap` is what that duplicate runs: it reconciles only the
//!   self-managing stack.
//!
//! Cycles never overlap. A trigger arriving while a cycle is running waits
//! for it to finish, in arrival order.

use metrics::counter;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, info_span, warn, Instrument};

use crate::application::duplicator::SelfBootstrapDuplicator;
use crate::application::node_config::NodeConfigResolver;
use crate::domain::cycle::{CycleMode, CyclePhase, CycleReport};
use crate::domain::error::{DeployError, StackFailure};
use crate::domain::manifest::StackDeclaration;
use crate::domain::repository::{RepositoryLocation, RepositorySync, WorkingCopy};
use crate::domain::settings::ConnectionParameters;
use crate::domain::stack::StackLifecycle;

pub struct DeploymentOrchestrator {
    repository: Arc<dyn RepositorySync>,
    stacks: Arc<dyn StackLifecycle>,
    duplicator: SelfBootstrapDuplicator,
    work_dir: PathBuf,
    cycle_lock: Mutex<()>,
}

impl DeploymentOrchestrator {
    pub fn new(
        repository: Arc<dyn RepositorySync>,
        stacks: Arc<dyn StackLifecycle>,
        duplicator: SelfBootstrapDuplicator,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            repository,
            stacks,
            duplicator,
            work_dir: work_dir.into(),
            cycle_lock: Mutex::new(()),
        }
    }

    /// Full cycle: every workload stack, then self-duplication when the
    /// node declares a self-managing stack.
    pub async fn deploy(&self, params: &ConnectionParameters) -> Result<CycleReport, DeployError> {
        self.run_cycle(CycleMode::Deploy, params).await
    }

    /// Reconcile only the self-managing stack.
    pub async fn bootstrap(
        &self,
        params: &ConnectionParameters,
    ) -> Result<CycleReport, DeployError> {
        self.run_cycle(CycleMode::Bootstrap, params).await
    }

    async fn run_cycle(
        &self,
        mode: CycleMode,
        params: &ConnectionParameters,
    ) -> Result<CycleReport, DeployError> {
        let _guard = self.cycle_lock.lock().await;

        let mut report = CycleReport::new(mode);
        let span = info_span!(
            "cycle",
            cycle_id = %report.id,
            mode = mode.as_str(),
            node = %params.node,
        );

        async {
            info!(remote = %params.remote_url, branch = %params.branch, "Starting cycle");

            let result = self.execute(&mut report, params).await;
            let outcome = match &result {
                Ok(()) => {
                    report.advance(CyclePhase::Done);
                    info!(
                        reconciled = report.reconciled.len(),
                        head = report.head.as_deref().unwrap_or("unknown"),
                        "Cycle finished"
                    );
                    "success"
                }
                Err(e) => {
                    let failed_in = report.fail();
                    error!(error = %e, phase = ?failed_in, "Cycle failed");
                    "failure"
                }
            };
            counter!("stackd_cycles_total", "mode" => mode.as_str(), "outcome" => outcome)
                .increment(1);

            result.map(|()| report)
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        report: &mut CycleReport,
        params: &ConnectionParameters,
    ) -> Result<(), DeployError> {
        report.advance(CyclePhase::Syncing);
        let location = RepositoryLocation {
            remote_url: params.remote_url.clone(),
            branch: params.branch.clone(),
            local_path: self.work_dir.clone(),
        };
        let working_copy = self.repository.sync(&location).await?;
        report.head = working_copy.head().map(str::to_string);

        report.advance(CyclePhase::Resolving);
        let Some(entry) = NodeConfigResolver::resolve(&working_copy, &params.node)? else {
            return Ok(());
        };

        report.advance(CyclePhase::ReconcilingStacks);
        let mut failures = Vec::new();

        match report.mode {
            CycleMode::Deploy => {
                for stack in entry.workload_stacks() {
                    self.reconcile(&working_copy, stack, report, &mut failures)
                        .await?;
                }

                if let Some(self_stack) = entry.self_stack() {
                    report.advance(CyclePhase::SelfDuplicating);
                    let duplicated = self.duplicator.duplicate_self(params).await;
                    let outcome = if duplicated.is_ok() { "success" } else { "failure" };
                    counter!("stackd_self_duplications_total", "outcome" => outcome).increment(1);
                    match duplicated {
                        Ok(id) => report.duplicate = Some(id),
                        // earlier stack failures must still reach the caller
                        Err(e) if !failures.is_empty() => {
                            report.failed.push(self_stack.path.clone());
                            failures.push(StackFailure {
                                stack: self_stack.path.clone(),
                                error: e.to_string(),
                            });
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
            CycleMode::Bootstrap => match entry.self_stack() {
                Some(stack) => {
                    self.reconcile(&working_copy, stack, report, &mut failures)
                        .await?
                }
                None => warn!("No self-managing stack declared for this node, nothing to bootstrap"),
            },
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DeployError::StacksFailed { failures })
        }
    }

    /// Recoverable stack errors are collected so the remaining stacks still
    /// run. Anything else aborts the cycle.
    async fn reconcile(
        &self,
        working_copy: &WorkingCopy,
        stack: &StackDeclaration,
        report: &mut CycleReport,
        failures: &mut Vec<StackFailure>,
    ) -> Result<(), DeployError> {
        match self.stacks.reconcile(working_copy, stack).await {
            Ok(()) => {
                counter!("stackd_stack_reconciliations_total", "outcome" => "success")
                    .increment(1);
                report.reconciled.push(stack.path.clone());
                Ok(())
            }
            Err(e) if !e.is_fatal() => {
                counter!("stackd_stack_reconciliations_total", "outcome" => "failure")
                    .increment(1);
                error!(stack = %stack.path, error = %e, "Stack failed, continuing with the next one");
                report.failed.push(stack.path.clone());
                failures.push(StackFailure {
                    stack: stack.path.clone(),
                    error: e.to_string(),
                });
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
