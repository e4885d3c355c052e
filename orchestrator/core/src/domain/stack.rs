// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;

use crate::domain::error::DeployError;
use crate::domain::manifest::StackDeclaration;
use crate::domain::repository::WorkingCopy;

/// Brings one declared stack down and back up from the working copy.
#[async_trait]
pub trait StackLifecycle: Send + Sync {
    async fn reconcile(
        &self,
        working_copy: &WorkingCopy,
        stack: &StackDeclaration,
    ) -> Result<(), DeployError>;
}
