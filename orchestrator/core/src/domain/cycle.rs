// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::runtime::InstanceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleId(pub Uuid);

impl CycleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CycleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Which entry point started the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleMode {
    /// Reconcile every workload stack, then duplicate self
    Deploy,
    /// Reconcile only the self-managing stack
    Bootstrap,
}

impl CycleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleMode::Deploy => "deploy",
            CycleMode::Bootstrap => "bootstrap",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Idle,
    Syncing,
    Resolving,
    ReconcilingStacks,
    SelfDuplicating,
    Done,
    Failed,
}

impl CyclePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CyclePhase::Done | CyclePhase::Failed)
    }

    /// Whether moving from `self` to `next` follows the cycle state machine.
    pub fn can_advance_to(&self, next: CyclePhase) -> bool {
        use CyclePhase::*;
        match (self, next) {
            (Done, _) | (Failed, _) => false,
            (_, Failed) => true,
            (Idle, Syncing) => true,
            (Syncing, Resolving) => true,
            // node without an entry finishes straight after resolving
            (Resolving, ReconcilingStacks) | (Resolving, Done) => true,
            (ReconcilingStacks, SelfDuplicating) | (ReconcilingStacks, Done) => true,
            (SelfDuplicating, Done) => true,
            _ => false,
        }
    }
}

/// Outcome of one reconciliation cycle. Kept in memory only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub id: CycleId,
    pub mode: CycleMode,
    pub phase: CyclePhase,
    pub head: Option<String>,
    pub reconciled: Vec<String>,
    pub failed: Vec<String>,
    pub duplicate: Option<InstanceId>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl CycleReport {
    pub fn new(mode: CycleMode) -> Self {
        Self {
            id: CycleId::new(),
            mode,
            phase: CyclePhase::Idle,
            head: None,
            reconciled: vec![],
            failed: vec![],
            duplicate: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Move to `next`. Illegal transitions are ignored and logged.
    pub fn advance(&mut self, next: CyclePhase) {
        if !self.phase.can_advance_to(next) {
            tracing::warn!(cycle_id = %self.id, from = ?self.phase, to = ?next, "Ignoring invalid cycle transition");
            return;
        }
        self.phase = next;
        if next.is_terminal() {
            self.ended_at = Some(Utc::now());
        }
    }

    /// Move to `Failed` and return the phase the cycle failed in.
    pub fn fail(&mut self) -> CyclePhase {
        let failed_in = self.phase;
        self.advance(CyclePhase::Failed);
        failed_in
    }

    /// Number of stacks a compose action was attempted on.
    pub fn attempted(&self) -> usize {
        self.reconciled.len() + self.failed.len()
    }
}
