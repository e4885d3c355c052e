// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod compose;
pub mod git;
pub mod manifest_parser;
pub mod runtime;
