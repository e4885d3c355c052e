// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Lib
//!
//! Core of the stackd deployment agent: keeps a node's compose stacks in
//! step with a git repository, including the stack the agent itself runs in.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain model, deployment use cases, git/compose/docker adapters and the webhook API

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
