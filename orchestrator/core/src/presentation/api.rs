// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::application::DeploymentOrchestrator;
use crate::domain::settings::ConnectionParameters;
use crate::domain::webhook::{is_authorized, WebhookToken};

pub struct AppState {
    pub orchestrator: Arc<DeploymentOrchestrator>,
    pub connection: ConnectionParameters,
    pub tokens: Vec<WebhookToken>,
}

pub fn webhook_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/webhook/{token}", post(trigger_deploy))
        .with_state(Arc::new(state))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn trigger_deploy(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    if !is_authorized(&state.tokens, &token) {
        warn!("Rejected webhook call with unknown token");
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "status": "error", "error": "not found" })),
        );
    }

    info!(node = %state.connection.node, "Webhook triggered deploy");

    // The cycle runs on its own task: a caller hanging up drops this
    // future, and must not abort compose halfway through a stack.
    let orchestrator = state.orchestrator.clone();
    let connection = state.connection.clone();
    let cycle = tokio::spawn(async move { orchestrator.deploy(&connection).await });

    match cycle.await {
        Ok(Ok(report)) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "cycle_id": report.id.to_string() })),
        ),
        Ok(Err(e)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "error", "error": e.to_string() })),
        ),
        Err(e) => {
            error!(error = %e, "Deploy task did not complete");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "error": e.to_string() })),
            )
        }
    }
}
