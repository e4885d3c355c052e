// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP tests for the webhook router.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tower::ServiceExt;

use stackd_core::application::{DeploymentOrchestrator, SelfBootstrapDuplicator};
use stackd_core::domain::error::DeployError;
use stackd_core::domain::manifest::{NodeIdentity, StackDeclaration, MANIFEST_FILE_NAME};
use stackd_core::domain::repository::{RepositoryLocation, RepositorySync, WorkingCopy};
use stackd_core::domain::runtime::{
    ContainerEngine, InstanceId, LaunchSpec, RunningContainer, RuntimeError,
};
use stackd_core::domain::settings::ConnectionParameters;
use stackd_core::domain::stack::StackLifecycle;
use stackd_core::domain::webhook::{WebhookToken, WEBHOOK_TOKEN_LEN};
use stackd_core::presentation::api::{webhook_router, AppState};

struct LocalRepo {
    root: std::path::PathBuf,
    reachable: bool,
    syncs: AtomicUsize,
}

#[async_trait]
impl RepositorySync for LocalRepo {
    async fn sync(&self, location: &RepositoryLocation) -> Result<WorkingCopy, DeployError> {
        self.syncs.fetch_add(1, Ordering::SeqCst);
        if !self.reachable {
            return Err(DeployError::Sync {
                remote_url: location.remote_url.clone(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(WorkingCopy::new(&self.root, None))
    }
}

/// Takes `delay` per stack and counts how many reconciliations ran to the end.
#[derive(Default)]
struct TimedStacks {
    delay: Duration,
    started: AtomicUsize,
    finished: AtomicUsize,
}

#[async_trait]
impl StackLifecycle for TimedStacks {
    async fn reconcile(&self, _: &WorkingCopy, _: &StackDeclaration) -> Result<(), DeployError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct NoContainers;

#[async_trait]
impl ContainerEngine for NoContainers {
    async fn running_containers(&self) -> Result<Vec<RunningContainer>, RuntimeError> {
        Ok(vec![])
    }

    async fn launch(&self, _: LaunchSpec) -> Result<InstanceId, RuntimeError> {
        Err(RuntimeError::LaunchFailed("unexpected launch".to_string()))
    }
}

fn token_value() -> String {
    "s3cr3t".chars().cycle().take(WEBHOOK_TOKEN_LEN).collect()
}

fn token() -> WebhookToken {
    WebhookToken::parse(&token_value()).unwrap()
}

fn webhook_uri() -> String {
    format!("/webhook/{}", token_value())
}

fn router(dir: &tempfile::TempDir, reachable: bool) -> (axum::Router, Arc<LocalRepo>) {
    router_with_stacks(dir, reachable, Arc::new(TimedStacks::default()))
}

fn router_with_stacks(
    dir: &tempfile::TempDir,
    reachable: bool,
    stacks: Arc<TimedStacks>,
) -> (axum::Router, Arc<LocalRepo>) {
    std::fs::write(
        dir.path().join(MANIFEST_FILE_NAME),
        "nodes:\n  n1:\n    stacks:\n      - path: web\n",
    )
    .unwrap();

    let repo = Arc::new(LocalRepo {
        root: dir.path().to_path_buf(),
        reachable,
        syncs: AtomicUsize::new(0),
    });
    let duplicator = SelfBootstrapDuplicator::new(Arc::new(NoContainers), "/var/run/docker.sock");
    let orchestrator = Arc::new(DeploymentOrchestrator::new(
        repo.clone(),
        stacks,
        duplicator,
        dir.path(),
    ));

    let state = AppState {
        orchestrator,
        connection: ConnectionParameters {
            remote_url: "http://git.local/stacks.git".to_string(),
            branch: "main".to_string(),
            node: NodeIdentity::new("n1"),
        },
        tokens: vec![token()],
    };
    (webhook_router(state), repo)
}

async fn call(router: axum::Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let (router, repo) = router(&dir, true);

    let (status, body) = call(router, "GET", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(repo.syncs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_known_token_runs_deploy() {
    let dir = tempfile::tempdir().unwrap();
    let (router, repo) = router(&dir, true);

    let (status, body) = call(router, "POST", &webhook_uri()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["cycle_id"].is_string());
    assert_eq!(repo.syncs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_token_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (router, repo) = router(&dir, true);

    let (status, _) = call(router, "POST", "/webhook/guess").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(repo.syncs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_cycle_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _) = router(&dir, false);

    let (status, body) = call(router, "POST", &webhook_uri()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_cycle_survives_caller_hanging_up() {
    let dir = tempfile::tempdir().unwrap();
    let stacks = Arc::new(TimedStacks {
        delay: Duration::from_millis(500),
        ..Default::default()
    });
    let (router, _) = router_with_stacks(&dir, true, stacks.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move { axum::serve(listener, router).await });

    let mut client = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "POST {} HTTP/1.1\r\nHost: {}\r\nContent-Length: 0\r\n\r\n",
        webhook_uri(),
        addr
    );
    client.write_all(request.as_bytes()).await.unwrap();

    // hang up while the stack is still being reconciled
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(stacks.started.load(Ordering::SeqCst), 1);
    drop(client);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while stacks.finished.load(Ordering::SeqCst) == 0 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "cycle did not finish after the caller disconnected"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(stacks.finished.load(Ordering::SeqCst), 1);

    server.abort();
}
