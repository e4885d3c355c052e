// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`stackd-core`)
//!
//! HTTP surface that turns webhook deliveries into deployment cycles. All
//! real work is delegated to [`crate::application::DeploymentOrchestrator`].
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | Health check and token-guarded deploy webhook |

pub mod api;
