// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Deployment Error Taxonomy
//!
//! Every failure a reconciliation cycle can produce. Sync, manifest and
//! self-lookup failures abort the whole cycle; a single stack failure is
//! collected and surfaced as [`DeployError::StacksFailed`] once every other
//! stack has been attempted.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Shared error type for all core components

use std::path::PathBuf;
use thiserror::Error;

/// Field path used when the manifest cannot be parsed at all.
pub const ROOT_FIELD_PATH: &str = "<root>";

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Repository sync failed for {remote_url}: {reason}")]
    Sync { remote_url: String, reason: String },

    #[error("Manifest not found: {0}")]
    ManifestMissing(PathBuf),

    #[error("Invalid manifest at '{path}': {message}")]
    ManifestInvalid { path: String, message: String },

    #[error("Stack directory not found: {0}")]
    StackNotFound(PathBuf),

    #[error("Stack '{stack}' failed during compose {action}: {reason}")]
    StackLifecycle {
        stack: String,
        action: ComposeAction,
        reason: String,
    },

    #[error("Could not find own container for host '{0}'")]
    SelfNotFound(String),

    #[error("Failed to launch duplicate of image '{image}': {reason}")]
    Duplication { image: String, reason: String },

    #[error("Invalid configuration: {}", format_fields(.fields))]
    ConfigValidation { fields: Vec<FieldIssue> },

    #[error("{} stack(s) failed: {}", .failures.len(), format_failures(.failures))]
    StacksFailed { failures: Vec<StackFailure> },
}

impl DeployError {
    /// Whether this error ends the reconciliation cycle immediately.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            DeployError::StackNotFound(_) | DeployError::StackLifecycle { .. }
        )
    }
}

/// Compose sub-command that was running when a stack failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeAction {
    Down,
    Up,
}

impl ComposeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComposeAction::Down => "down",
            ComposeAction::Up => "up",
        }
    }
}

impl std::fmt::Display for ComposeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed stack inside an aggregate failure.
#[derive(Debug, Clone)]
pub struct StackFailure {
    pub stack: String,
    pub error: String,
}

/// One configuration field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub kind: FieldIssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldIssueKind {
    /// Required value was not supplied by file, environment or flag.
    Missing,
    /// Value was supplied but is not acceptable.
    Invalid(String),
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            FieldIssueKind::Missing => write!(f, "{} is required", self.field),
            FieldIssueKind::Invalid(reason) => write!(f, "{}: {}", self.field, reason),
        }
    }
}

fn format_fields(fields: &[FieldIssue]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_failures(failures: &[StackFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.stack, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}
