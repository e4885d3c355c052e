// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Compose-driven stack lifecycle.
//!
//! A stack is reconciled by a full `down` followed by
//! `up --detach --force-recreate`. Recreating unconditionally means a
//! rebuilt image, a changed bind-mounted file or a new environment value is
//! always picked up, at the price of restarting containers whose definition
//! did not change.
//!
//! Output is requested as JSON progress records and streamed line by line
//! into the log while the command runs.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::domain::error::{ComposeAction, DeployError};
use crate::domain::manifest::StackDeclaration;
use crate::domain::progress::ProgressEvent;
use crate::domain::repository::WorkingCopy;
use crate::domain::runtime::{docker_host, DOCKER_HOST_VAR};
use crate::domain::stack::StackLifecycle;

const OUTPUT_FLAGS: [&str; 2] = ["--ansi=never", "--progress=json"];

pub struct ComposeStackManager {
    /// Program followed by leading arguments, e.g. `["docker", "compose"]`
    command: Vec<String>,
    /// Exported as `DOCKER_HOST`; unset leaves compose on its own default.
    docker_host: Option<String>,
}

impl ComposeStackManager {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            docker_host: None,
        }
    }

    /// Point every compose invocation at the daemon behind `socket`.
    pub fn with_docker_socket(mut self, socket: &str) -> Self {
        self.docker_host = Some(docker_host(socket));
        self
    }

    /// Arguments passed for `action`, after the output flags.
    pub fn action_args(action: ComposeAction, stack: &StackDeclaration) -> Vec<&'static str> {
        match action {
            ComposeAction::Down => vec!["down"],
            ComposeAction::Up if stack.build => {
                vec!["up", "--detach", "--force-recreate", "--build"]
            }
            ComposeAction::Up => vec!["up", "--detach", "--force-recreate"],
        }
    }

    async fn run(
        &self,
        stack: &StackDeclaration,
        dir: &Path,
        action: ComposeAction,
    ) -> Result<(), DeployError> {
        let failure = |reason: String| DeployError::StackLifecycle {
            stack: stack.path.clone(),
            action,
            reason,
        };

        let (program, leading) = self
            .command
            .split_first()
            .ok_or_else(|| failure("no compose command configured".to_string()))?;

        let mut cmd = Command::new(program);
        cmd.args(leading)
            .args(OUTPUT_FLAGS)
            .args(Self::action_args(action, stack))
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(host) = &self.docker_host {
            cmd.env(DOCKER_HOST_VAR, host);
        }

        debug!(stack = %stack.path, command = ?cmd, "Running compose");

        let mut child = cmd
            .spawn()
            .map_err(|e| failure(format!("failed to start {}: {}", program, e)))?;

        if let Err(reason) = stream_progress(&mut child, &stack.path).await {
            let _ = child.kill().await;
            return Err(failure(reason));
        }

        let status = child
            .wait()
            .await
            .map_err(|e| failure(format!("failed to wait for compose: {}", e)))?;

        if !status.success() {
            let reason = match status.code() {
                Some(code) => format!("exit code {}", code),
                None => "terminated by signal".to_string(),
            };
            return Err(failure(reason));
        }
        Ok(())
    }
}

/// Log every line of stdout and stderr as it arrives. Returns the reason on
/// the first line that is not a progress record.
async fn stream_progress(child: &mut Child, stack: &str) -> Result<(), String> {
    let stdout = child.stdout.take().ok_or("compose stdout not captured")?;
    let stderr = child.stderr.take().ok_or("compose stderr not captured")?;

    let mut out = BufReader::new(stdout).lines();
    let mut err = BufReader::new(stderr).lines();
    let (mut out_done, mut err_done) = (false, false);

    while !(out_done && err_done) {
        let (from_stdout, line) = tokio::select! {
            line = out.next_line(), if !out_done => (true, line),
            line = err.next_line(), if !err_done => (false, line),
        };

        match line {
            Ok(Some(line)) => handle_line(&line, stack)?,
            Ok(None) if from_stdout => out_done = true,
            Ok(None) => err_done = true,
            Err(e) => return Err(format!("failed to read compose output: {}", e)),
        }
    }
    Ok(())
}

fn handle_line(line: &str, stack: &str) -> Result<(), String> {
    if line.trim().is_empty() {
        return Ok(());
    }
    let event = ProgressEvent::parse_line(line)
        .map_err(|e| format!("unparseable progress line {:?}: {}", line, e))?;
    event.log(stack);
    Ok(())
}

#[async_trait]
impl StackLifecycle for ComposeStackManager {
    async fn reconcile(
        &self,
        working_copy: &WorkingCopy,
        stack: &StackDeclaration,
    ) -> Result<(), DeployError> {
        info!(stack = %stack.path, build = stack.build, "Processing stack");

        let dir = working_copy.root().join(&stack.path);
        if !dir.is_dir() {
            return Err(DeployError::StackNotFound(dir));
        }

        self.run(stack, &dir, ComposeAction::Down).await?;
        self.run(stack, &dir, ComposeAction::Up).await?;

        info!(stack = %stack.path, "Stack is up");
        Ok(())
    }
}
