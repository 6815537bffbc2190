//! Mutation primitives.
//!
//! Every structural change goes through one of these methods. Each call is
//! one atomic unit: it updates the node, keeps the parent registry in step
//! and, when a recorder is armed, reports one [`PatchRecorderEvent`] carrying
//! the forward patches and their inverses.

use std::collections::HashSet;

use indexmap::IndexMap;
use json_joy_tree_path::PathStep;
use serde_json::Value;

use super::Tree;
use crate::error::{TreeError, TreeResult};
use crate::node::{NodeData, NodeId, NodeKind, TreeValue};
use crate::parent::{ParentPath, RootPath};
use crate::patch::recorder::PatchRecorderEvent;
use crate::patch::Patch;

impl Tree {
    /// Sets an object property, or an array element when `node` is an array.
    ///
    /// For arrays, `key` must denote an index `<= len`; setting at `len`
    /// appends.
    pub fn set(
        &mut self,
        node: NodeId,
        key: impl Into<PathStep>,
        value: impl Into<TreeValue>,
    ) -> TreeResult<()> {
        let key = key.into();
        let value = value.into();
        match self.kind(node)? {
            NodeKind::Object => self.set_prop(node, key.as_key().into_owned(), value),
            NodeKind::Array => {
                let index = key
                    .as_index()
                    .ok_or_else(|| TreeError::invalid_path(&[key.clone()], "not an array index"))?;
                let len = self.len(node)?;
                if index == len {
                    self.splice(node, index, 0, vec![value]).map(|_| ())
                } else if index > len {
                    Err(TreeError::IndexOutOfRange { index, len })
                } else {
                    self.set_element(node, index, value)
                }
            }
        }
    }

    /// Materializes `value` and sets it. The fresh node is disposed again if
    /// the set fails.
    pub fn set_json(&mut self, node: NodeId, key: impl Into<PathStep>, value: &Value) -> TreeResult<()> {
        let v = self.materialize(value);
        let result = self.set(node, key, v.clone());
        self.discard_on_error(v, result)
    }

    /// Removes an object property (absent keys are a no-op returning `None`)
    /// or an array element (shifting the rest left).
    pub fn delete(&mut self, node: NodeId, key: impl Into<PathStep>) -> TreeResult<Option<TreeValue>> {
        let key = key.into();
        match self.kind(node)? {
            NodeKind::Object => self.delete_prop(node, key.as_key().as_ref()),
            NodeKind::Array => {
                let index = key
                    .as_index()
                    .ok_or_else(|| TreeError::invalid_path(&[key.clone()], "not an array index"))?;
                let len = self.len(node)?;
                if index >= len {
                    return Err(TreeError::IndexOutOfRange { index, len });
                }
                Ok(self.splice(node, index, 1, Vec::new())?.pop())
            }
        }
    }

    pub fn push(&mut self, node: NodeId, value: impl Into<TreeValue>) -> TreeResult<()> {
        let len = self.array(node)?.len();
        self.splice(node, len, 0, vec![value.into()]).map(|_| ())
    }

    pub fn push_json(&mut self, node: NodeId, value: &Value) -> TreeResult<()> {
        let v = self.materialize(value);
        let result = self.push(node, v.clone());
        self.discard_on_error(v, result)
    }

    /// Inserts before `index`, shifting later elements right.
    pub fn insert(&mut self, node: NodeId, index: usize, value: impl Into<TreeValue>) -> TreeResult<()> {
        self.splice(node, index, 0, vec![value.into()]).map(|_| ())
    }

    pub fn insert_json(&mut self, node: NodeId, index: usize, value: &Value) -> TreeResult<()> {
        let v = self.materialize(value);
        let result = self.insert(node, index, v.clone());
        self.discard_on_error(v, result)
    }

    /// Array splice: removes `delete_count` elements at `index` and inserts
    /// `items` there. Returns the removed values; removed nodes are detached
    /// and stay alive as roots.
    pub fn splice(
        &mut self,
        node: NodeId,
        index: usize,
        delete_count: usize,
        items: Vec<TreeValue>,
    ) -> TreeResult<Vec<TreeValue>> {
        let len = self.array(node)?.len();
        if index > len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }
        let delete_count = delete_count.min(len - index);
        let mut seen = HashSet::new();
        for item in &items {
            self.check_attachable(node, item)?;
            if let Some(id) = item.as_node() {
                if !seen.insert(id) {
                    return Err(TreeError::AlreadyAttached(id));
                }
            }
        }

        let recording = self.is_recording();
        let pre_images: Vec<Value> = if recording {
            self.array(node)?[index..index + delete_count]
                .iter()
                .map(|v| self.snapshot_value(v))
                .collect()
        } else {
            Vec::new()
        };
        let inserted = items.len();
        let forward_values: Vec<Value> = if recording {
            items.iter().map(|v| self.snapshot_value(v)).collect()
        } else {
            Vec::new()
        };

        let arr = self.array_mut(node)?;
        let removed: Vec<TreeValue> = arr.splice(index..index + delete_count, items).collect();
        let shifted: Vec<(usize, NodeId)> = arr[index..]
            .iter()
            .enumerate()
            .filter_map(|(k, v)| v.as_node().map(|id| (index + k, id)))
            .collect();

        for id in removed.iter().filter_map(TreeValue::as_node) {
            self.detach_from_parent(id);
        }
        for (i, child) in shifted {
            if i < index + inserted {
                self.attach_to_parent(
                    child,
                    ParentPath {
                        parent: node,
                        path: PathStep::Index(i),
                    },
                );
            } else {
                self.reindex_child(child, node, i);
            }
        }

        if recording && (delete_count > 0 || inserted > 0) {
            let mut patches = Vec::with_capacity(delete_count + inserted);
            let mut inverse = Vec::with_capacity(delete_count + inserted);
            for pre in pre_images {
                patches.push(Patch::remove(vec![PathStep::Index(index)]));
                inverse.push(Patch::add(vec![PathStep::Index(index)], pre));
            }
            for (k, value) in forward_values.into_iter().enumerate() {
                patches.push(Patch::add(vec![PathStep::Index(index + k)], value));
                inverse.push(Patch::remove(vec![PathStep::Index(index + k)]));
            }
            self.emit(node, patches, inverse);
        }
        Ok(removed)
    }

    fn set_prop(&mut self, node: NodeId, name: String, value: TreeValue) -> TreeResult<()> {
        let old = self.object(node)?.get(&name).cloned();
        if old.as_ref() == Some(&value) {
            return Ok(());
        }
        self.check_attachable(node, &value)?;
        let recording = self.is_recording();
        let pre_image = if recording {
            old.as_ref().map(|v| self.snapshot_value(v))
        } else {
            None
        };

        self.object_mut(node)?.insert(name.clone(), value.clone());
        if let Some(TreeValue::Node(old_id)) = &old {
            self.detach_from_parent(*old_id);
        }
        if let TreeValue::Node(child) = &value {
            self.attach_to_parent(
                *child,
                ParentPath {
                    parent: node,
                    path: PathStep::Key(name.clone()),
                },
            );
        }

        if recording {
            let path = vec![PathStep::Key(name)];
            let new_value = self.snapshot_value(&value);
            let (forward, inverse) = match pre_image {
                Some(pre) => (Patch::replace(path.clone(), new_value), Patch::replace(path, pre)),
                None => (Patch::add(path.clone(), new_value), Patch::remove(path)),
            };
            self.emit(node, vec![forward], vec![inverse]);
        }
        Ok(())
    }

    fn set_element(&mut self, node: NodeId, index: usize, value: TreeValue) -> TreeResult<()> {
        let old = self.array(node)?[index].clone();
        if old == value {
            return Ok(());
        }
        self.check_attachable(node, &value)?;
        let recording = self.is_recording();
        let pre_image = recording.then(|| self.snapshot_value(&old));

        self.array_mut(node)?[index] = value.clone();
        if let TreeValue::Node(old_id) = old {
            self.detach_from_parent(old_id);
        }
        if let TreeValue::Node(child) = &value {
            self.attach_to_parent(
                *child,
                ParentPath {
                    parent: node,
                    path: PathStep::Index(index),
                },
            );
        }

        if let Some(pre) = pre_image {
            let path = vec![PathStep::Index(index)];
            let new_value = self.snapshot_value(&value);
            self.emit(
                node,
                vec![Patch::replace(path.clone(), new_value)],
                vec![Patch::replace(path, pre)],
            );
        }
        Ok(())
    }

    fn delete_prop(&mut self, node: NodeId, name: &str) -> TreeResult<Option<TreeValue>> {
        let Some(old) = self.object(node)?.get(name).cloned() else {
            return Ok(None);
        };
        let pre_image = self.is_recording().then(|| self.snapshot_value(&old));

        self.object_mut(node)?.shift_remove(name);
        if let TreeValue::Node(old_id) = &old {
            self.detach_from_parent(*old_id);
        }

        if let Some(pre) = pre_image {
            let path = vec![PathStep::Key(name.to_string())];
            self.emit(node, vec![Patch::remove(path.clone())], vec![Patch::add(path, pre)]);
        }
        Ok(Some(old))
    }

    /// A node can only be stored if it is a tracked root that is neither the
    /// target nor one of its ancestors.
    fn check_attachable(&self, parent: NodeId, value: &TreeValue) -> TreeResult<()> {
        let Some(child) = value.as_node() else {
            return Ok(());
        };
        self.assert_tracked(child)?;
        if self.fast_get_parent_path(child).is_some() {
            return Err(TreeError::AlreadyAttached(child));
        }
        if child == parent || self.fast_get_root(parent) == child {
            return Err(TreeError::CycleDetected { parent, child });
        }
        Ok(())
    }

    /// Reports a mutation of `node` with patches relative to `node`.
    fn emit(&mut self, node: NodeId, patches: Vec<Patch>, inverse_patches: Vec<Patch>) {
        let RootPath { root, path: prefix } = self.fast_get_root_path(node);
        let event = PatchRecorderEvent {
            target: root,
            patches: patches.iter().map(|p| p.with_prefix(&prefix)).collect(),
            inverse_patches: inverse_patches.iter().map(|p| p.with_prefix(&prefix)).collect(),
        };
        self.record(event);
    }

    fn discard_on_error(&mut self, value: TreeValue, result: TreeResult<()>) -> TreeResult<()> {
        if result.is_err() {
            if let TreeValue::Node(id) = value {
                if let Err(err) = self.dispose(id) {
                    tracing::warn!(%id, %err, "fresh node could not be disposed");
                }
            }
        }
        result
    }

    fn object(&self, node: NodeId) -> TreeResult<&IndexMap<String, TreeValue>> {
        match self.data(node)? {
            NodeData::Object(map) => Ok(map),
            NodeData::Array(_) => Err(TreeError::InvalidTarget(format!("{node} is not an object"))),
        }
    }

    fn object_mut(&mut self, node: NodeId) -> TreeResult<&mut IndexMap<String, TreeValue>> {
        match self.data_mut(node)? {
            NodeData::Object(map) => Ok(map),
            NodeData::Array(_) => Err(TreeError::InvalidTarget(format!("{node} is not an object"))),
        }
    }

    fn array(&self, node: NodeId) -> TreeResult<&Vec<TreeValue>> {
        match self.data(node)? {
            NodeData::Array(arr) => Ok(arr),
            NodeData::Object(_) => Err(TreeError::InvalidTarget(format!("{node} is not an array"))),
        }
    }

    fn array_mut(&mut self, node: NodeId) -> TreeResult<&mut Vec<TreeValue>> {
        match self.data_mut(node)? {
            NodeData::Array(arr) => Ok(arr),
            NodeData::Object(_) => Err(TreeError::InvalidTarget(format!("{node} is not an array"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn child(tree: &Tree, node: NodeId, key: &str) -> NodeId {
        tree.get(node, key).unwrap().and_then(TreeValue::as_node).unwrap()
    }

    #[test]
    fn splice_rekeys_shifted_children() {
        let mut tree = Tree::new();
        let root = tree.create_root(&json!([{"a": 0}, {"a": 1}, {"a": 2}])).unwrap();
        let last = child(&tree, root, "2");
        let removed = tree.splice(root, 0, 1, Vec::new()).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(tree.fast_get_parent_path(last).unwrap().path, PathStep::Index(1));

        let first_removed = removed[0].as_node().unwrap();
        assert!(tree.is_root(first_removed).unwrap());

        tree.splice(root, 0, 0, vec![TreeValue::from(7), TreeValue::from(8)]).unwrap();
        assert_eq!(tree.fast_get_parent_path(last).unwrap().path, PathStep::Index(3));
        assert_eq!(tree.get_snapshot(root).unwrap(), json!([7, 8, {"a": 1}, {"a": 2}]));
    }

    #[test]
    fn attaching_requires_a_detached_root() {
        let mut tree = Tree::new();
        let root = tree.create_root(&json!({"a": {}, "b": {}})).unwrap();
        let a = child(&tree, root, "a");
        assert_eq!(tree.set(root, "c", a), Err(TreeError::AlreadyAttached(a)));
        assert_eq!(
            tree.set(a, "x", root),
            Err(TreeError::CycleDetected { parent: a, child: root })
        );
        assert_eq!(
            tree.set(root, "self", root),
            Err(TreeError::CycleDetected { parent: root, child: root })
        );

        let moved = tree.delete(root, "a").unwrap().and_then(|v| v.as_node()).unwrap();
        tree.set(root, "c", moved).unwrap();
        assert_eq!(tree.get_root_path(moved).unwrap().path, vec![PathStep::from("c")]);
    }

    #[test]
    fn overwriting_detaches_the_old_child() {
        let mut tree = Tree::new();
        let root = tree.create_root(&json!({"p": {"y": 1}})).unwrap();
        let p = child(&tree, root, "p");
        tree.set(root, "p", 3).unwrap();
        assert!(tree.is_root(p).unwrap());
        assert_eq!(tree.get_snapshot(p).unwrap(), json!({"y": 1}));
    }

    #[test]
    fn array_set_bounds() {
        let mut tree = Tree::new();
        let root = tree.create_root(&json!([1])).unwrap();
        tree.set(root, 1usize, 2).unwrap();
        assert_eq!(
            tree.set(root, 5usize, 2),
            Err(TreeError::IndexOutOfRange { index: 5, len: 2 })
        );
        assert!(matches!(tree.set(root, "x", 2), Err(TreeError::InvalidPath { .. })));
        assert_eq!(tree.get_snapshot(root).unwrap(), json!([1, 2]));
    }

    #[test]
    fn failed_set_json_disposes_the_fresh_node() {
        let mut tree = Tree::new();
        let root = tree.create_root(&json!([])).unwrap();
        let before = tree.node_count();
        assert!(tree.set_json(root, 3usize, &json!({"x": 1})).is_err());
        assert_eq!(tree.node_count(), before);
    }
}
