//! Patch application.
//!
//! Patches are applied one by one through the tree's mutation primitives, so
//! an armed recorder sees patch application like any other mutation. A failing
//! patch aborts the call; patches applied before it stay applied.

use json_joy_tree_path::{validate_path_depth, PathStep};
use serde_json::Value;

use super::types::Patch;
use crate::error::{TreeError, TreeResult};
use crate::node::{NodeId, NodeKind, TreeValue};
use crate::parent::Resolution;
use crate::tree::Tree;

/// Applies `patches` in order against `root`.
pub fn apply_patches(tree: &mut Tree, root: NodeId, patches: &[Patch]) -> TreeResult<()> {
    tree.assert_tracked(root)?;
    for patch in patches {
        apply_patch(tree, root, patch)?;
    }
    Ok(())
}

/// Applies a single patch against `root`.
pub fn apply_patch(tree: &mut Tree, root: NodeId, patch: &Patch) -> TreeResult<()> {
    let path = patch.path();
    validate_path_depth(path, tree.config().max_depth)?;
    let Some((last, parent_path)) = path.split_last() else {
        return apply_to_root(tree, root, patch);
    };
    let parent = match tree.resolve_path(root, parent_path) {
        Resolution::Resolved(Some(TreeValue::Node(id))) if tree.is_tracked(id) => id,
        _ => {
            return Err(TreeError::invalid_path(
                path,
                "parent does not resolve to an object or array",
            ))
        }
    };

    match (tree.kind(parent)?, patch) {
        (NodeKind::Object, Patch::Add { value, .. }) => {
            tree.set_json(parent, last.as_key().into_owned(), value)
        }
        (NodeKind::Object, Patch::Replace { value, .. }) => {
            replace_slot(tree, parent, PathStep::Key(last.as_key().into_owned()), value)
        }
        (NodeKind::Object, Patch::Remove { .. }) => {
            tree.delete(parent, last.as_key().into_owned()).map(|_| ())
        }
        (NodeKind::Array, Patch::Add { value, .. }) => {
            let len = tree.len(parent)?;
            let index = match last {
                PathStep::Key(k) if k == "-" => len,
                step => array_index(path, step)?,
            };
            if index > len {
                return Err(TreeError::IndexOutOfRange { index, len });
            }
            tree.insert_json(parent, index, value)
        }
        (NodeKind::Array, Patch::Remove { .. }) => {
            let index = checked_index(tree, parent, path, last)?;
            tree.splice(parent, index, 1, Vec::new()).map(|_| ())
        }
        (NodeKind::Array, Patch::Replace { value, .. }) => {
            let index = checked_index(tree, parent, path, last)?;
            replace_slot(tree, parent, PathStep::Index(index), value)
        }
    }
}

fn array_index(path: &[PathStep], step: &PathStep) -> TreeResult<usize> {
    step.as_index()
        .ok_or_else(|| TreeError::invalid_path(path, format!("`{step}` is not an array index")))
}

/// Index of an existing element.
fn checked_index(tree: &Tree, array: NodeId, path: &[PathStep], step: &PathStep) -> TreeResult<usize> {
    let index = array_index(path, step)?;
    let len = tree.len(array)?;
    if index >= len {
        return Err(TreeError::IndexOutOfRange { index, len });
    }
    Ok(index)
}

/// Whether `value` carries the same embedded identity as `node`.
fn same_identity(tree: &Tree, node: NodeId, value: &Value) -> bool {
    match (tree.node_identity(node), tree.config().identity_key.of_value(value)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Replaces the value in `parent[step]`, keeping the node in place when the
/// replacement carries its identity.
fn replace_slot(tree: &mut Tree, parent: NodeId, step: PathStep, value: &Value) -> TreeResult<()> {
    let current = tree.resolve_path(parent, std::slice::from_ref(&step)).node();
    if let Some(existing) = current {
        if same_identity(tree, existing, value) {
            return reconcile(tree, existing, value);
        }
    }
    tree.set_json(parent, step, value)
}

/// Add or replace with an empty path.
///
/// With matching identities (or none on either side) the node is updated in
/// place. Otherwise the node is swapped in its parent slot; a root has no slot
/// and cannot change identity.
fn apply_to_root(tree: &mut Tree, root: NodeId, patch: &Patch) -> TreeResult<()> {
    let value = match patch {
        Patch::Remove { .. } => return Err(TreeError::invalid_path(&[], "cannot remove the root")),
        Patch::Add { value, .. } | Patch::Replace { value, .. } => value,
    };
    let kinds_match = matches!(
        (tree.kind(root)?, value),
        (NodeKind::Object, Value::Object(_)) | (NodeKind::Array, Value::Array(_))
    );
    let same = tree.node_identity(root) == tree.config().identity_key.of_value(value);
    if kinds_match && same {
        return reconcile(tree, root, value);
    }
    if let Some(pp) = tree.fast_get_parent_path(root).cloned() {
        return tree.set_json(pp.parent, pp.path, value);
    }
    Err(TreeError::invalid_path(
        &[],
        "cannot change the identity of a root node",
    ))
}

/// Mutates `node` until its snapshot equals `value`.
fn reconcile(tree: &mut Tree, node: NodeId, value: &Value) -> TreeResult<()> {
    match value {
        Value::Object(map) => {
            let stale: Vec<String> = tree
                .keys(node)?
                .into_iter()
                .filter(|k| !map.contains_key(k))
                .collect();
            for key in stale {
                tree.delete(node, key)?;
            }
            for (key, v) in map {
                reconcile_slot(tree, node, PathStep::Key(key.clone()), v)?;
            }
        }
        Value::Array(items) => {
            let len = tree.len(node)?;
            if len > items.len() {
                tree.splice(node, items.len(), len - items.len(), Vec::new())?;
            }
            for (i, v) in items.iter().enumerate() {
                if i < len {
                    reconcile_slot(tree, node, PathStep::Index(i), v)?;
                } else {
                    tree.insert_json(node, i, v)?;
                }
            }
        }
        primitive => {
            return Err(TreeError::InvalidValue(format!(
                "cannot reconcile a node with {primitive}"
            )))
        }
    }
    Ok(())
}

fn reconcile_slot(tree: &mut Tree, node: NodeId, step: PathStep, value: &Value) -> TreeResult<()> {
    let current = tree
        .resolve_path(node, std::slice::from_ref(&step))
        .value()
        .cloned();
    match current {
        Some(TreeValue::Node(existing)) => {
            if tree.snapshot_value(&TreeValue::Node(existing)) == *value {
                return Ok(());
            }
            if same_identity(tree, existing, value) {
                return reconcile(tree, existing, value);
            }
            tree.set_json(node, step, value)
        }
        Some(prim) if TreeValue::from_primitive(value).as_ref() == Some(&prim) => Ok(()),
        _ => tree.set_json(node, step, value),
    }
}

impl Tree {
    /// See [`apply_patches`].
    pub fn apply_patches(&mut self, root: NodeId, patches: &[Patch]) -> TreeResult<()> {
        apply_patches(self, root, patches)
    }
}
