// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Long-running mode: serves the webhook API until SIGINT/SIGTERM.

pub mod server;

pub use server::start_api;
