// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mod
//!
//! Domain types and ports of the deployment core.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements mod

pub mod cycle;
pub mod error;
pub mod manifest;
pub mod progress;
pub mod repository;
pub mod runtime;
pub mod settings;
pub mod stack;
pub mod webhook;
