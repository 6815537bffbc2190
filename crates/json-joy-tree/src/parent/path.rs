//! Path queries over the parent registry.
//!
//! The checked variants validate every node argument and fail with
//! [`TreeError::NotATrackedNode`](crate::error::TreeError::NotATrackedNode); the `fast_` variants skip validation and
//! are meant for internal hot paths.

use std::collections::HashSet;

use json_joy_tree_path::{Path, PathStep};

use super::{ParentPath, RootPath};
use crate::error::TreeResult;
use crate::node::{NodeData, NodeId, TreeValue};
use crate::tree::Tree;

/// Outcome of [`Tree::resolve_path`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Every step went through an object or array. The value is `None` when
    /// the last step names a missing property or element.
    Resolved(Option<TreeValue>),
    /// Some step had to index into a primitive or a missing value.
    Unresolved,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn value(&self) -> Option<&TreeValue> {
        match self {
            Resolution::Resolved(v) => v.as_ref(),
            Resolution::Unresolved => None,
        }
    }

    pub fn node(&self) -> Option<NodeId> {
        self.value().and_then(TreeValue::as_node)
    }
}

impl Tree {
    /// Returns the parent of `node` plus the step from the parent to it, or
    /// `None` when `node` is a root.
    pub fn get_parent_path(&self, node: NodeId) -> TreeResult<Option<&ParentPath>> {
        self.assert_tracked(node)?;
        Ok(self.fast_get_parent_path(node))
    }

    pub fn fast_get_parent_path(&self, node: NodeId) -> Option<&ParentPath> {
        self.parents.get(&node)
    }

    pub fn get_parent(&self, node: NodeId) -> TreeResult<Option<NodeId>> {
        self.assert_tracked(node)?;
        Ok(self.fast_get_parent(node))
    }

    pub fn fast_get_parent(&self, node: NodeId) -> Option<NodeId> {
        self.fast_get_parent_path(node).map(|pp| pp.parent)
    }

    /// Returns the root of `node` and the path from that root down to it.
    pub fn get_root_path(&self, node: NodeId) -> TreeResult<RootPath> {
        self.assert_tracked(node)?;
        Ok(self.fast_get_root_path(node))
    }

    /// # Panics
    ///
    /// Panics when the parent chain has more hops than the registry has
    /// entries, which only happens if the registry holds a cycle.
    pub fn fast_get_root_path(&self, node: NodeId) -> RootPath {
        let mut root = node;
        let mut path: Path = Vec::new();
        while let Some(pp) = self.fast_get_parent_path(root) {
            self.check_chain_length(node, path.len());
            path.push(pp.path.clone());
            root = pp.parent;
        }
        path.reverse();
        RootPath { root, path }
    }

    pub fn get_root(&self, node: NodeId) -> TreeResult<NodeId> {
        self.assert_tracked(node)?;
        Ok(self.fast_get_root(node))
    }

    pub fn fast_get_root(&self, node: NodeId) -> NodeId {
        self.fast_get_root_path(node).root
    }

    pub fn is_root(&self, node: NodeId) -> TreeResult<bool> {
        self.assert_tracked(node)?;
        Ok(self.fast_get_parent_path(node).is_none())
    }

    /// Whether `child` lies somewhere in the subtree below `parent`.
    pub fn is_child_of_parent(&self, child: NodeId, parent: NodeId) -> TreeResult<bool> {
        self.assert_tracked(child)?;
        self.assert_tracked(parent)?;
        Ok(self.deep_children(parent).contains(&child))
    }

    pub fn is_parent_of_child(&self, parent: NodeId, child: NodeId) -> TreeResult<bool> {
        self.is_child_of_parent(child, parent)
    }

    /// Every node strictly below `node`.
    pub fn deep_children(&self, node: NodeId) -> HashSet<NodeId> {
        let mut out = HashSet::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(data) = self.arena.get(id) {
                for child in data.child_nodes() {
                    if out.insert(child) {
                        stack.push(child);
                    }
                }
            }
        }
        out
    }

    /// Walks `path` from `root` one step at a time.
    ///
    /// Does not validate `root`: an untracked root resolves only the empty path.
    pub fn resolve_path(&self, root: NodeId, path: &[PathStep]) -> Resolution {
        let mut current = Some(TreeValue::Node(root));
        for step in path {
            let node = match &current {
                Some(TreeValue::Node(id)) => *id,
                _ => return Resolution::Unresolved,
            };
            current = match self.arena.get(node) {
                Some(NodeData::Object(map)) => map.get(step.as_key().as_ref()).cloned(),
                Some(NodeData::Array(arr)) => step.as_index().and_then(|i| arr.get(i)).cloned(),
                None => return Resolution::Unresolved,
            };
        }
        Resolution::Resolved(current)
    }

    /// Path from `from_parent` down to `to_child`.
    ///
    /// `Some(vec![])` when both are the same node, `None` when `to_child` is
    /// not below `from_parent`.
    pub fn get_parent_to_child_path(
        &self,
        from_parent: NodeId,
        to_child: NodeId,
    ) -> TreeResult<Option<Path>> {
        self.assert_tracked(from_parent)?;
        self.assert_tracked(to_child)?;
        if from_parent == to_child {
            return Ok(Some(Vec::new()));
        }
        let mut path = Vec::new();
        let mut current = to_child;
        while let Some(pp) = self.fast_get_parent_path(current) {
            self.check_chain_length(to_child, path.len());
            path.push(pp.path.clone());
            current = pp.parent;
            if current == from_parent {
                path.reverse();
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    /// An acyclic chain uses each registry entry at most once, so a walk
    /// that has taken as many hops as there are entries is in a cycle.
    pub(crate) fn check_chain_length(&self, node: NodeId, hops: usize) {
        let entries = self.parents.len();
        if hops >= entries {
            tracing::error!(%node, hops, "parent chain does not terminate");
            panic!("parent chain of {node} exceeds {entries} hops: parent registry holds a cycle");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use crate::error::TreeError;
    use serde_json::json;

    fn tree() -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let root = tree
            .create_root(&json!({"a": {"b": [10, {"c": 1}]}, "p": 5}))
            .unwrap();
        (tree, root)
    }

    fn node_at(tree: &Tree, root: NodeId, path: &[PathStep]) -> NodeId {
        tree.resolve_path(root, path).node().unwrap()
    }

    #[test]
    fn root_path_walks_to_the_top() {
        let (tree, root) = tree();
        let c = node_at(&tree, root, &["a".into(), "b".into(), PathStep::Index(1)]);
        let rp = tree.get_root_path(c).unwrap();
        assert_eq!(rp.root, root);
        assert_eq!(rp.path, vec![PathStep::from("a"), PathStep::from("b"), PathStep::Index(1)]);
        assert_eq!(tree.get_root(c).unwrap(), root);
        assert!(!tree.is_root(c).unwrap());
        assert!(tree.is_root(root).unwrap());
    }

    #[test]
    fn resolve_accepts_numeric_keys_for_arrays() {
        let (tree, root) = tree();
        let by_key = tree.resolve_path(root, &["a".into(), "b".into(), "0".into()]);
        let by_index = tree.resolve_path(root, &["a".into(), "b".into(), PathStep::Index(0)]);
        assert_eq!(by_key, by_index);
        assert_eq!(by_key.value(), Some(&TreeValue::from(10)));
    }

    #[test]
    fn resolve_stops_at_primitives() {
        let (tree, root) = tree();
        assert_eq!(tree.resolve_path(root, &[]), Resolution::Resolved(Some(TreeValue::Node(root))));
        assert_eq!(tree.resolve_path(root, &["missing".into()]), Resolution::Resolved(None));
        assert_eq!(tree.resolve_path(root, &["p".into(), "x".into()]), Resolution::Unresolved);
        assert_eq!(
            tree.resolve_path(root, &["missing".into(), "x".into()]),
            Resolution::Unresolved
        );
    }

    #[test]
    fn membership_uses_descendants() {
        let (tree, root) = tree();
        let a = node_at(&tree, root, &["a".into()]);
        let c = node_at(&tree, root, &["a".into(), "b".into(), PathStep::Index(1)]);
        assert!(tree.is_child_of_parent(c, root).unwrap());
        assert!(tree.is_parent_of_child(a, c).unwrap());
        assert!(!tree.is_child_of_parent(a, c).unwrap());
        assert!(!tree.is_child_of_parent(root, root).unwrap());
    }

    #[test]
    fn parent_to_child_path() {
        let (tree, root) = tree();
        let a = node_at(&tree, root, &["a".into()]);
        let c = node_at(&tree, root, &["a".into(), "b".into(), PathStep::Index(1)]);
        assert_eq!(tree.get_parent_to_child_path(a, a).unwrap(), Some(vec![]));
        assert_eq!(
            tree.get_parent_to_child_path(a, c).unwrap(),
            Some(vec![PathStep::from("b"), PathStep::Index(1)])
        );
        assert_eq!(tree.get_parent_to_child_path(c, a).unwrap(), None);
    }

    #[test]
    fn untracked_nodes_are_rejected() {
        let (mut tree, root) = tree();
        let other = tree.create_root(&json!([])).unwrap();
        tree.dispose(other).unwrap();
        assert_eq!(tree.get_parent(other), Err(TreeError::NotATrackedNode(other)));
        assert_eq!(tree.get_root_path(other), Err(TreeError::NotATrackedNode(other)));
        assert!(tree.is_child_of_parent(other, root).is_err());
    }

    #[test]
    fn chains_deeper_than_the_patch_path_limit_are_walked() {
        let mut tree = Tree::with_config(TreeConfig::default().with_max_depth(2));
        let root = tree.create_root(&json!({"a": {"b": {"c": {}}}})).unwrap();
        let c = node_at(&tree, root, &["a".into(), "b".into(), "c".into()]);
        let rp = tree.get_root_path(c).unwrap();
        assert_eq!(rp.root, root);
        assert_eq!(rp.path.len(), 3);
        assert_eq!(tree.get_parent_to_child_path(root, c).unwrap().map(|p| p.len()), Some(3));
        tree.set_json(c, "d", &json!({"e": 1})).unwrap();
        assert_eq!(tree.get_snapshot(root).unwrap()["a"]["b"]["c"]["d"]["e"], json!(1));
    }

    #[test]
    #[should_panic(expected = "parent registry holds a cycle")]
    fn corrupted_registry_panics_instead_of_looping() {
        let (mut tree, root) = tree();
        let a = node_at(&tree, root, &["a".into()]);
        tree.parents.insert(
            root,
            ParentPath {
                parent: a,
                path: PathStep::from("loop"),
            },
        );
        tree.fast_get_root_path(a);
    }
}
