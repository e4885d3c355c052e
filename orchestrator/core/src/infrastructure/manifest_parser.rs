// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Stack Manifest YAML Parser
//!
//! Parses `stackd.yaml` from the root of a synchronized working copy into
//! the domain [`RepoManifest`].
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Parse external YAML → Domain objects
//! - **Anti-Corruption:** Schema violations are reported with the field path
//!   that failed (`nodes.n1.stacks[0].path`), never as a generic crash
//!
//! # Manifest Format
//!
//! ```yaml
//! nodes:
//!   n1:
//!     stacks:
//!       - path: web
//!       - path: agent
//!         self: true
//!       - path: custom
//!         build: true
//! ```

use serde_yaml::{Mapping, Value};
use std::path::{Component, Path};

use crate::domain::error::{DeployError, ROOT_FIELD_PATH};
use crate::domain::manifest::{RepoManifest, MANIFEST_FILE_NAME};

// ============================================================================
// Parser API
// ============================================================================

pub struct ManifestParser;

impl ManifestParser {
    /// Parse the manifest at the root of `repo_root`.
    pub fn parse_repository(repo_root: &Path) -> Result<RepoManifest, DeployError> {
        Self::parse_file(repo_root.join(MANIFEST_FILE_NAME))
    }

    /// Parse a manifest file
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<RepoManifest, DeployError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DeployError::ManifestMissing(path.to_path_buf()));
        }

        let yaml = std::fs::read_to_string(path).map_err(|e| DeployError::ManifestInvalid {
            path: ROOT_FIELD_PATH.to_string(),
            message: format!("failed to read {}: {}", path.display(), e),
        })?;

        Self::parse_yaml(&yaml)
    }

    /// Parse a manifest from a YAML string
    pub fn parse_yaml(yaml: &str) -> Result<RepoManifest, DeployError> {
        let mut value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| invalid(ROOT_FIELD_PATH, e.to_string()))?;

        if value.is_null() {
            return Ok(RepoManifest::default());
        }

        check_root(&value)?;
        drop_empty_sections(&mut value);

        serde_yaml::from_value(value).map_err(|e| invalid(ROOT_FIELD_PATH, e.to_string()))
    }
}

// ============================================================================
// Structural checks
// ============================================================================

fn invalid(path: impl Into<String>, message: impl Into<String>) -> DeployError {
    DeployError::ManifestInvalid {
        path: path.into(),
        message: message.into(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn expect_mapping<'a>(value: &'a Value, path: &str) -> Result<&'a Mapping, DeployError> {
    value
        .as_mapping()
        .ok_or_else(|| invalid(path, format!("expected a mapping, found {}", type_name(value))))
}

fn check_root(root: &Value) -> Result<(), DeployError> {
    let root = expect_mapping(root, ROOT_FIELD_PATH)?;

    let Some(nodes) = root.get("nodes") else {
        return Ok(());
    };
    if nodes.is_null() {
        return Ok(());
    }

    for (key, node) in expect_mapping(nodes, "nodes")? {
        let name = match key {
            Value::String(s) if !s.is_empty() => s.clone(),
            other => {
                return Err(invalid(
                    "nodes",
                    format!("node names must be non-empty strings, found {}", type_name(other)),
                ))
            }
        };
        check_node(&format!("nodes.{}", name), node)?;
    }
    Ok(())
}

fn check_node(path: &str, node: &Value) -> Result<(), DeployError> {
    if node.is_null() {
        return Ok(());
    }
    let node = expect_mapping(node, path)?;

    let stacks_path = format!("{}.stacks", path);
    let stacks = match node.get("stacks") {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::Sequence(seq)) => seq,
        Some(other) => {
            return Err(invalid(
                stacks_path,
                format!("expected a list, found {}", type_name(other)),
            ))
        }
    };

    let mut self_stacks = 0;
    for (i, stack) in stacks.iter().enumerate() {
        if check_stack(&format!("{}[{}]", stacks_path, i), stack)? {
            self_stacks += 1;
        }
    }

    if self_stacks > 1 {
        return Err(invalid(
            stacks_path,
            format!("declares {} self-managing stacks, at most one is allowed", self_stacks),
        ));
    }
    Ok(())
}

/// Blank `nodes:`, `<node>:` and `stacks:` entries mean "nothing declared".
fn drop_empty_sections(root: &mut Value) {
    let Some(root) = root.as_mapping_mut() else {
        return;
    };
    if root.get("nodes").is_some_and(Value::is_null) {
        root.remove("nodes");
    }
    let Some(nodes) = root.get_mut("nodes").and_then(Value::as_mapping_mut) else {
        return;
    };
    for (_, node) in nodes.iter_mut() {
        if node.is_null() {
            *node = Value::Mapping(Mapping::new());
        }
        if let Some(node) = node.as_mapping_mut() {
            if node.get("stacks").is_some_and(Value::is_null) {
                node.remove("stacks");
            }
        }
    }
}

/// Returns whether the stack is marked self-managing.
fn check_stack(path: &str, stack: &Value) -> Result<bool, DeployError> {
    let stack = expect_mapping(stack, path)?;

    let path_field = format!("{}.path", path);
    let stack_path = match stack.get("path") {
        None => return Err(invalid(path_field, "missing field")),
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(invalid(
                path_field,
                format!("expected a string, found {}", type_name(other)),
            ))
        }
    };
    check_stack_path(&path_field, stack_path)?;

    for flag in ["self", "build"] {
        match stack.get(flag) {
            None | Some(Value::Bool(_)) => {}
            Some(other) => {
                return Err(invalid(
                    format!("{}.{}", path, flag),
                    format!("expected a boolean, found {}", type_name(other)),
                ))
            }
        }
    }

    Ok(matches!(stack.get("self"), Some(Value::Bool(true))))
}

/// Stack paths must stay inside the repository.
fn check_stack_path(field: &str, value: &str) -> Result<(), DeployError> {
    if value.trim().is_empty() {
        return Err(invalid(field, "cannot be empty"));
    }

    let path = Path::new(value);
    for component in path.components() {
        match component {
            Component::ParentDir => {
                tracing::warn!(path = %value, "Stack path contains '..' component");
                return Err(invalid(field, format!("'{}' escapes the repository", value)));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid(field, format!("'{}' must be relative", value)));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::manifest::{NodeIdentity, StackDeclaration};

    fn invalid_path(result: Result<RepoManifest, DeployError>) -> String {
        match result {
            Err(DeployError::ManifestInvalid { path, .. }) => path,
            other => panic!("expected ManifestInvalid, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_full_manifest() {
        let yaml = r#"
nodes:
  n1:
    stacks:
      - path: web
      - path: agent
        self: true
      - path: my-custom
        build: true
  n2:
    stacks: []
"#;

        let manifest = ManifestParser::parse_yaml(yaml).unwrap();
        let entry = manifest.entry_for(&NodeIdentity::new("n1")).unwrap();
        assert_eq!(
            entry.stacks,
            vec![
                StackDeclaration::new("web"),
                StackDeclaration::self_managing("agent"),
                StackDeclaration::new("my-custom").with_build(),
            ]
        );
        assert!(manifest
            .entry_for(&NodeIdentity::new("n2"))
            .unwrap()
            .stacks
            .is_empty());
    }

    #[test]
    fn test_empty_manifest_has_no_nodes() {
        assert!(ManifestParser::parse_yaml("").unwrap().nodes.is_empty());
        assert!(ManifestParser::parse_yaml("nodes:\n").unwrap().nodes.is_empty());

        let manifest = ManifestParser::parse_yaml("nodes:\n  n1:\n  n2:\n    stacks:\n").unwrap();
        assert!(manifest.entry_for(&NodeIdentity::new("n1")).unwrap().stacks.is_empty());
        assert!(manifest.entry_for(&NodeIdentity::new("n2")).unwrap().stacks.is_empty());
    }

    #[test]
    fn test_non_list_stacks_names_field() {
        let yaml = "nodes:\n  n1:\n    stacks: web\n";
        assert_eq!(invalid_path(ManifestParser::parse_yaml(yaml)), "nodes.n1.stacks");
    }

    #[test]
    fn test_missing_stack_path_names_index() {
        let yaml = "nodes:\n  n1:\n    stacks:\n      - path: web\n      - self: true\n";
        assert_eq!(
            invalid_path(ManifestParser::parse_yaml(yaml)),
            "nodes.n1.stacks[1].path"
        );
    }

    #[test]
    fn test_non_bool_flag() {
        let yaml = "nodes:\n  n1:\n    stacks:\n      - path: web\n        build: often\n";
        assert_eq!(
            invalid_path(ManifestParser::parse_yaml(yaml)),
            "nodes.n1.stacks[0].build"
        );
    }

    #[test]
    fn test_two_self_stacks_rejected() {
        let yaml = r#"
nodes:
  n1:
    stacks:
      - path: a
        self: true
      - path: b
        self: true
"#;
        assert_eq!(invalid_path(ManifestParser::parse_yaml(yaml)), "nodes.n1.stacks");
    }

    #[test]
    fn test_escaping_paths_rejected() {
        for bad in ["../outside", "/etc", "a/../../b", "  "] {
            let yaml = format!("nodes:\n  n1:\n    stacks:\n      - path: \"{}\"\n", bad);
            assert_eq!(
                invalid_path(ManifestParser::parse_yaml(&yaml)),
                "nodes.n1.stacks[0].path",
                "path {:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_nodes_must_be_mapping() {
        assert_eq!(invalid_path(ManifestParser::parse_yaml("nodes: [n1]\n")), "nodes");
        assert_eq!(invalid_path(ManifestParser::parse_yaml("- nodes\n")), ROOT_FIELD_PATH);
    }

    #[test]
    fn test_syntax_error_is_invalid_not_panic() {
        assert_eq!(
            invalid_path(ManifestParser::parse_yaml("nodes: {n1: [\n")),
            ROOT_FIELD_PATH
        );
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        match ManifestParser::parse_repository(dir.path()) {
            Err(DeployError::ManifestMissing(path)) => {
                assert_eq!(path, dir.path().join(MANIFEST_FILE_NAME))
            }
            other => panic!("expected ManifestMissing, got {:?}", other),
        }
    }
}
