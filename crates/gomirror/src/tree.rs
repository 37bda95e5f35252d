//! Import path forest construction
//!
//! Arranges module import paths into a forest of per-segment nodes, the
//! shape the filesystem projector materializes.

use thiserror::Error;

use crate::module::Module;

/// Errors that can occur while building the module forest
#[derive(Debug, Error)]
pub enum TreeError {
    /// A module record had an empty import path
    #[error("Invalid empty module path")]
    EmptyPath,

    /// Two module records resolved to the same node
    #[error("Cannot insert module {path} into node {segment}: module {existing} already exists")]
    DuplicateModule {
        /// Path of the record being inserted
        path: String,
        /// Segment of the node both records resolve to
        segment: String,
        /// Path of the record already attached to the node
        existing: String,
    },
}

/// One node of the import path forest.
///
/// A node may carry a module, children, or both: a module whose path is a
/// strict prefix of another module's path (`example.org/b` next to
/// `example.org/b/1`) yields a node with both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    /// The path component this node represents
    pub segment: String,

    /// Module whose import path terminates exactly at this node
    pub module: Option<Module>,

    /// Child nodes, in insertion order, each with a distinct segment
    pub children: Vec<Node>,
}

impl Node {
    fn new(segment: &str) -> Self {
        Node {
            segment: segment.to_string(),
            module: None,
            children: Vec::new(),
        }
    }

    /// Find a direct child by segment
    pub fn child(&self, segment: &str) -> Option<&Node> {
        self.children.iter().find(|child| child.segment == segment)
    }
}

/// Build the import path forest for a list of modules.
///
/// Records are sorted by path first so insertion order is deterministic.
/// Each distinct first segment becomes a forest root, created on first
/// sight; deeper segments become children along the way. The forest is
/// returned in root-creation order — compare trees by content, not by
/// position.
///
/// Fails with [`TreeError::EmptyPath`] for a record without a path and
/// with [`TreeError::DuplicateModule`] when two records share one.
pub fn build_nodes(mut modules: Vec<Module>) -> Result<Vec<Node>, TreeError> {
    modules.sort_by(|a, b| a.path.cmp(&b.path));

    let mut roots: Vec<Node> = Vec::new();
    for module in modules {
        if module.path.is_empty() {
            return Err(TreeError::EmptyPath);
        }

        let path = module.path.clone();
        let segments: Vec<&str> = path.split('/').collect();

        let idx = match roots.iter().position(|root| root.segment == segments[0]) {
            Some(idx) => idx,
            None => {
                roots.push(Node::new(segments[0]));
                roots.len() - 1
            }
        };

        insert_module(&mut roots[idx], module, &segments[1..])?;
    }

    Ok(roots)
}

fn insert_module(node: &mut Node, module: Module, segments: &[&str]) -> Result<(), TreeError> {
    let (segment, rest) = match segments.split_first() {
        Some((segment, rest)) => (segment, rest),
        None => {
            if let Some(existing) = &node.module {
                return Err(TreeError::DuplicateModule {
                    path: module.path,
                    segment: node.segment.clone(),
                    existing: existing.path.clone(),
                });
            }

            node.module = Some(module);
            return Ok(());
        }
    };

    let idx = match node.children.iter().position(|child| child.segment == *segment) {
        Some(idx) => idx,
        None => {
            node.children.push(Node::new(segment));
            node.children.len() - 1
        }
    };

    insert_module(&mut node.children[idx], module, rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn module(path: &str) -> Module {
        Module {
            path: path.to_string(),
            dir: PathBuf::from("/tmp").join(path),
            version: "v1.0.0".to_string(),
            main: false,
        }
    }

    fn find_root<'a>(roots: &'a [Node], segment: &str) -> &'a Node {
        roots
            .iter()
            .find(|root| root.segment == segment)
            .unwrap_or_else(|| panic!("no root with segment {segment}"))
    }

    #[test]
    fn test_single_segment_path() {
        let roots = build_nodes(vec![module("a")]).unwrap();

        assert_eq!(roots.len(), 1);
        let root = find_root(&roots, "a");
        assert_eq!(root.module, Some(module("a")));
        assert!(root.children.is_empty());
    }

    #[test]
    fn test_shared_root_segment() {
        let roots = build_nodes(vec![module("example.org/b"), module("example.org/c")]).unwrap();

        assert_eq!(roots.len(), 1);
        let root = find_root(&roots, "example.org");
        assert!(root.module.is_none());
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.child("b").unwrap().module, Some(module("example.org/b")));
        assert_eq!(root.child("c").unwrap().module, Some(module("example.org/c")));
    }

    #[test]
    fn test_prefix_module_keeps_children() {
        let roots = build_nodes(vec![module("a/b/c"), module("a/b")]).unwrap();

        let b = find_root(&roots, "a").child("b").unwrap();
        assert_eq!(b.module, Some(module("a/b")));
        assert_eq!(b.children.len(), 1);
        assert_eq!(b.child("c").unwrap().module, Some(module("a/b/c")));
    }

    #[test]
    fn test_empty_path_rejected() {
        let result = build_nodes(vec![module("")]);
        assert!(matches!(result, Err(TreeError::EmptyPath)));
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let mut other = module("example.org/b");
        other.version = "v2.0.0".to_string();

        let result = build_nodes(vec![module("example.org/b"), other]);

        match result {
            Err(TreeError::DuplicateModule { path, segment, existing }) => {
                assert_eq!(path, "example.org/b");
                assert_eq!(segment, "b");
                assert_eq!(existing, "example.org/b");
            }
            other => panic!("expected duplicate module error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_error_names_both_paths() {
        let result = build_nodes(vec![module("a"), module("a")]);

        let err = result.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Cannot insert module a"), "message: {message}");
        assert!(message.contains("module a already exists"), "message: {message}");
    }

    #[test]
    fn test_intermediate_nodes_carry_no_module() {
        let roots = build_nodes(vec![module("example.org/b/1")]).unwrap();

        let root = find_root(&roots, "example.org");
        assert!(root.module.is_none());
        let b = root.child("b").unwrap();
        assert!(b.module.is_none());
        assert_eq!(b.child("1").unwrap().module, Some(module("example.org/b/1")));
    }
}
