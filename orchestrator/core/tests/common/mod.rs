// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Fixtures shared by the integration tests: a throwaway git remote and a
//! fake compose binary that records how it was called.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=stackd",
            "-c",
            "user.email=stackd@example.com",
            "-c",
            "commit.gpgsign=false",
            "-c",
            "init.defaultBranch=main",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A bare remote with `main` as its default branch, plus a seed clone used
/// to push commits into it.
pub struct GitRemote {
    pub bare: PathBuf,
    pub seed: PathBuf,
}

impl GitRemote {
    pub fn create(root: &Path) -> Self {
        let bare = root.join("remote.git");
        let seed = root.join("seed");
        std::fs::create_dir_all(&bare).unwrap();
        std::fs::create_dir_all(&seed).unwrap();

        git(&bare, &["init", "--bare", "."]);
        git(&bare, &["symbolic-ref", "HEAD", "refs/heads/main"]);

        git(&seed, &["init", "."]);
        git(&seed, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        git(&seed, &["remote", "add", "origin", bare.to_str().unwrap()]);

        Self { bare, seed }
    }

    pub fn url(&self) -> String {
        self.bare.to_string_lossy().into_owned()
    }

    /// Write `files` into the seed, commit and push. Returns the new head.
    pub fn commit(&self, files: &[(&str, &str)], message: &str) -> String {
        for (path, content) in files {
            let target = self.seed.join(path);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(target, content).unwrap();
        }
        git(&self.seed, &["add", "--all"]);
        git(&self.seed, &["commit", "-m", message]);
        git(&self.seed, &["push", "origin", "main"]);
        git(&self.seed, &["rev-parse", "HEAD"])
    }
}

/// Writes a shell script standing in for `docker compose`.
///
/// Each call appends `<stack dir name> <args>` to the returned log. A stack
/// directory containing `fail-up` makes `up` exit with code 3; one containing
/// `garbage` makes every call print a non-JSON line. A non-empty
/// `DOCKER_HOST` is written to `docker-host` in the stack directory.
pub fn fake_compose(dir: &Path) -> (Vec<String>, PathBuf) {
    let log = dir.join("compose.log");
    let script = dir.join("fake-compose.sh");
    let body = format!(
        r#"#!/bin/sh
printf '%s %s\n' "$(basename "$(pwd -P)")" "$*" >> '{log}'
if [ -n "$DOCKER_HOST" ]; then
  printf '%s\n' "$DOCKER_HOST" > docker-host
fi
echo '{{"level":"info","msg":"compose starting"}}'
echo '{{"id":"Container 1","status":"Started"}}' >&2
if [ -f garbage ]; then
  echo 'this is not json'
fi
case " $* " in
  *" up "*)
    if [ -f fail-up ]; then
      echo '{{"level":"error","msg":"no such image"}}' >&2
      exit 3
    fi
    ;;
esac
exit 0
"#,
        log = log.display()
    );
    std::fs::write(&script, body).unwrap();

    let command = vec!["sh".to_string(), script.to_string_lossy().into_owned()];
    (command, log)
}

pub fn compose_calls(log: &Path) -> Vec<String> {
    std::fs::read_to_string(log)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
