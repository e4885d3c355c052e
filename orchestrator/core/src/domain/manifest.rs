// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Stack Manifest Types
//!
//! Domain model of the manifest file (`stackd.yaml`) kept at the root of the
//! stack-configuration repository. It maps each node identity to the ordered
//! list of stacks that node should run.
//!
//! The manifest is re-read on every reconciliation cycle so that the latest
//! commit is always authoritative. Nothing here is cached.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// File name of the manifest at the repository root.
pub const MANIFEST_FILE_NAME: &str = "stackd.yaml";

/// Identity of "this machine" inside the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIdentity(String);

impl NodeIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single stack declared for a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDeclaration {
    /// Directory of the stack relative to the repository root
    pub path: String,

    /// This stack runs the agent itself
    #[serde(rename = "self", default)]
    pub is_self: bool,

    /// Images must be rebuilt from the repository before starting
    #[serde(default)]
    pub build: bool,
}

impl StackDeclaration {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_self: false,
            build: false,
        }
    }

    pub fn self_managing(path: impl Into<String>) -> Self {
        Self {
            is_self: true,
            ..Self::new(path)
        }
    }

    pub fn with_build(mut self) -> Self {
        self.build = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default)]
    pub stacks: Vec<StackDeclaration>,
}

/// Whole manifest as stored in the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoManifest {
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeSpec>,
}

impl RepoManifest {
    /// Extract the entry for one node, if the manifest declares it.
    pub fn entry_for(&self, node: &NodeIdentity) -> Option<NodeManifestEntry> {
        self.nodes.get(node.as_str()).map(|spec| NodeManifestEntry {
            node: node.clone(),
            stacks: spec.stacks.clone(),
        })
    }
}

/// Stacks declared for one node, in manifest order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeManifestEntry {
    pub node: NodeIdentity,
    pub stacks: Vec<StackDeclaration>,
}

impl NodeManifestEntry {
    /// The stack that runs the agent, if this node declares one.
    pub fn self_stack(&self) -> Option<&StackDeclaration> {
        self.stacks.iter().find(|s| s.is_self)
    }

    /// Ordinary workload stacks, in manifest order.
    pub fn workload_stacks(&self) -> impl Iterator<Item = &StackDeclaration> {
        self.stacks.iter().filter(|s| !s.is_self)
    }
}
