// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Result;
use colored::Colorize;

use stackd_core::domain::settings::ENV_WEBHOOK_IDS;
use stackd_core::domain::webhook::WebhookToken;

/// Print a fresh webhook token.
pub fn new_webhook() -> Result<()> {
    let token = WebhookToken::generate();

    println!("{}", token.as_str());
    eprintln!(
        "{}",
        format!(
            "Add it to webhook_ids in the settings file or to {}, then call POST /webhook/<token>",
            ENV_WEBHOOK_IDS
        )
        .dimmed()
    );
    Ok(())
}
