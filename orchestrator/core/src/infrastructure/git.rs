// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Git working-copy synchronization.
//!
//! Shells out to the `git` binary. Every command gets an explicit working
//! directory; the process's own current directory is never changed.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::domain::error::DeployError;
use crate::domain::repository::{RepositoryLocation, RepositorySync, WorkingCopy};

pub struct GitSynchronizer {
    program: String,
}

impl GitSynchronizer {
    pub fn new() -> Self {
        Self {
            program: "git".to_string(),
        }
    }

    /// Use a different git binary.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn git(
        &self,
        location: &RepositoryLocation,
        cwd: &Path,
        args: &[&str],
    ) -> Result<String, DeployError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(command = ?cmd, "Running git");

        let output = cmd.output().await.map_err(|e| DeployError::Sync {
            remote_url: location.remote_url.clone(),
            reason: format!("failed to run git {}: {}", args.join(" "), e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeployError::Sync {
                remote_url: location.remote_url.clone(),
                reason: format!("git {} failed: {}", args.join(" "), stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for GitSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

fn has_git_metadata(path: &Path) -> bool {
    path.join(".git").is_dir()
}

#[async_trait]
impl RepositorySync for GitSynchronizer {
    async fn sync(&self, location: &RepositoryLocation) -> Result<WorkingCopy, DeployError> {
        let local = &location.local_path;
        info!(remote = %location.remote_url, branch = %location.branch, path = %local.display(), "Syncing stack repository");

        if !has_git_metadata(local) {
            info!(remote = %location.remote_url, "Cloning repository");
            let (parent, name) = match (local.parent(), local.file_name()) {
                (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
                    (parent.to_path_buf(), name.to_string_lossy().into_owned())
                }
                (_, Some(name)) => (PathBuf::from("."), name.to_string_lossy().into_owned()),
                _ => {
                    return Err(DeployError::Sync {
                        remote_url: location.remote_url.clone(),
                        reason: format!("{} cannot hold a working copy", local.display()),
                    })
                }
            };
            tokio::fs::create_dir_all(&parent)
                .await
                .map_err(|e| DeployError::Sync {
                    remote_url: location.remote_url.clone(),
                    reason: format!("failed to create {}: {}", parent.display(), e),
                })?;

            self.git(location, &parent, &["clone", &location.remote_url, &name])
                .await?;
        }

        if !has_git_metadata(local) {
            return Err(DeployError::Sync {
                remote_url: location.remote_url.clone(),
                reason: format!("{} is not a git repository", local.display()),
            });
        }

        self.git(location, local, &["checkout", &location.branch]).await?;
        self.git(location, local, &["pull", "origin", &location.branch])
            .await?;

        let head = self.git(location, local, &["rev-parse", "HEAD"]).await?;
        info!(head = %head, "Updated stack repository to latest version");

        Ok(WorkingCopy::new(local.clone(), Some(head)))
    }
}
