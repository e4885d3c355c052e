// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Process exit codes for the `stackd` binary.

use colored::Colorize;
use tracing::error;

use stackd_core::domain::error::DeployError;

/// Exit code for missing or invalid settings (EX_USAGE).
pub const EXIT_CONFIG: i32 = 64;

/// Exit code for every other failure.
pub const EXIT_FAILURE: i32 = 1;

pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<DeployError>() {
        Some(DeployError::ConfigValidation { .. }) => EXIT_CONFIG,
        _ => EXIT_FAILURE,
    }
}

/// Print the failure and pick the exit code.
pub fn report_error(err: &anyhow::Error) -> i32 {
    if let Some(DeployError::ConfigValidation { fields }) = err.downcast_ref::<DeployError>() {
        eprintln!("{}", "Invalid configuration:".red().bold());
        for field in fields {
            eprintln!("  {} {}", "✗".red(), field);
        }
    } else {
        error!("{:#}", err);
        eprintln!("{} {:#}", "Error:".red().bold(), err);
    }
    exit_code_for(err)
}
