// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use tracing::{debug, warn};

use crate::domain::error::DeployError;
use crate::domain::manifest::{NodeIdentity, NodeManifestEntry};
use crate::domain::repository::WorkingCopy;
use crate::infrastructure::manifest_parser::ManifestParser;

/// Looks up what the current node should run from a fresh working copy.
pub struct NodeConfigResolver;

impl NodeConfigResolver {
    /// `Ok(None)` means the manifest has no entry for `node`: there is
    /// nothing to do on this machine.
    pub fn resolve(
        working_copy: &WorkingCopy,
        node: &NodeIdentity,
    ) -> Result<Option<NodeManifestEntry>, DeployError> {
        let manifest = ManifestParser::parse_repository(working_copy.root())?;

        match manifest.entry_for(node) {
            Some(entry) => {
                debug!(node = %node, stacks = entry.stacks.len(), "Resolved node configuration");
                Ok(Some(entry))
            }
            None => {
                warn!(node = %node, "Node not found in manifest, nothing to do");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::manifest::MANIFEST_FILE_NAME;

    fn working_copy(manifest: Option<&str>) -> (tempfile::TempDir, WorkingCopy) {
        let dir = tempfile::tempdir().unwrap();
        if let Some(content) = manifest {
            std::fs::write(dir.path().join(MANIFEST_FILE_NAME), content).unwrap();
        }
        let wc = WorkingCopy::new(dir.path(), None);
        (dir, wc)
    }

    #[test]
    fn test_resolves_declared_node() {
        let (_dir, wc) = working_copy(Some("nodes:\n  n1:\n    stacks:\n      - path: web\n"));
        let entry = NodeConfigResolver::resolve(&wc, &NodeIdentity::new("n1"))
            .unwrap()
            .unwrap();
        assert_eq!(entry.node, NodeIdentity::new("n1"));
        assert_eq!(entry.stacks.len(), 1);
    }

    #[test]
    fn test_absent_node_is_not_an_error() {
        let (_dir, wc) = working_copy(Some("nodes:\n  n1:\n    stacks: []\n"));
        assert!(NodeConfigResolver::resolve(&wc, &NodeIdentity::new("n2"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_missing_manifest() {
        let (_dir, wc) = working_copy(None);
        assert!(matches!(
            NodeConfigResolver::resolve(&wc, &NodeIdentity::new("n1")),
            Err(DeployError::ManifestMissing(_))
        ));
    }
}
