// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Webhook HTTP server

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use stackd_core::domain::settings::AgentConfig;
use stackd_core::presentation::api::{webhook_router, AppState};

use crate::commands::deploy::build_orchestrator;

pub async fn start_api(config: AgentConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.api.bind_address.clone());
    let port = port.unwrap_or(config.api.port);

    if let Some(metrics_port) = config.api.metrics_port {
        let metrics_addr: SocketAddr = format!("{}:{}", host, metrics_port)
            .parse()
            .with_context(|| format!("Invalid metrics address {}:{}", host, metrics_port))?;
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Metrics exporter listening on {}", metrics_addr);
    }

    if config.webhook_tokens.is_empty() {
        warn!("No webhook ids configured, every webhook call will be rejected");
    }

    let orchestrator = Arc::new(build_orchestrator(&config)?);
    let app = webhook_router(AppState {
        orchestrator,
        connection: config.connection.clone(),
        tokens: config.webhook_tokens.clone(),
    });

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(node = %config.connection.node, "Webhook API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Webhook API shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
