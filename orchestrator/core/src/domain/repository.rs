// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Stack Repository Interfaces
//!
//! Contract for keeping a local working copy of the stack-configuration
//! repository in step with its remote, defined in the domain layer and
//! implemented in `crate::infrastructure::git`.
//!
//! | Trait | Implementations |
//! |-------|----------------|
//! | `RepositorySync` | `GitSynchronizer` |
//!
//! The synchronizer exclusively owns the on-disk working copy. Everything
//! downstream receives a [`WorkingCopy`] and treats it as read-only.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::error::DeployError;

/// Where the stack repository comes from and where it is checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocation {
    pub remote_url: String,
    pub branch: String,
    pub local_path: PathBuf,
}

/// A synchronized checkout, ready to be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingCopy {
    root: PathBuf,
    head: Option<String>,
}

impl WorkingCopy {
    pub fn new(root: impl Into<PathBuf>, head: Option<String>) -> Self {
        Self {
            root: root.into(),
            head,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Commit id checked out after the sync, when known.
    pub fn head(&self) -> Option<&str> {
        self.head.as_deref()
    }
}

#[async_trait]
pub trait RepositorySync: Send + Sync {
    /// Clone or update the working copy so it matches `branch` on the remote.
    async fn sync(&self, location: &RepositoryLocation) -> Result<WorkingCopy, DeployError>;
}
