//! Plain data ↔ live node conversion.

use indexmap::IndexMap;
use json_joy_tree_path::PathStep;
use serde_json::{Map, Value};

use super::Tree;
use crate::error::{TreeError, TreeResult};
use crate::node::{NodeData, NodeId, TreeValue};
use crate::parent::ParentPath;

impl Tree {
    /// Materializes plain JSON into live values.
    ///
    /// Objects and arrays become fresh nodes (the outermost one detached);
    /// primitives are returned inline.
    pub fn materialize(&mut self, value: &Value) -> TreeValue {
        match value {
            Value::Object(map) => {
                let props: IndexMap<String, TreeValue> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), self.materialize(v)))
                    .collect();
                let children: Vec<(PathStep, NodeId)> = props
                    .iter()
                    .filter_map(|(k, v)| v.as_node().map(|id| (PathStep::Key(k.clone()), id)))
                    .collect();
                let id = self.arena.alloc(NodeData::Object(props));
                self.register_children(id, children);
                TreeValue::Node(id)
            }
            Value::Array(items) => {
                let elements: Vec<TreeValue> = items.iter().map(|v| self.materialize(v)).collect();
                let children: Vec<(PathStep, NodeId)> = elements
                    .iter()
                    .enumerate()
                    .filter_map(|(i, v)| v.as_node().map(|id| (PathStep::Index(i), id)))
                    .collect();
                let id = self.arena.alloc(NodeData::Array(elements));
                self.register_children(id, children);
                TreeValue::Node(id)
            }
            primitive => TreeValue::from_primitive(primitive).unwrap_or(TreeValue::Null),
        }
    }

    fn register_children(&mut self, parent: NodeId, children: Vec<(PathStep, NodeId)>) {
        for (path, child) in children {
            self.attach_to_parent(child, ParentPath { parent, path });
        }
    }

    /// Creates a new root node from an object or array snapshot.
    pub fn create_root(&mut self, value: &Value) -> TreeResult<NodeId> {
        if !(value.is_object() || value.is_array()) {
            return Err(TreeError::InvalidValue(format!(
                "a root must be an object or array, got {value}"
            )));
        }
        match self.materialize(value) {
            TreeValue::Node(id) => {
                tracing::trace!(%id, "created root");
                Ok(id)
            }
            _ => Err(TreeError::InvalidValue("root did not materialize to a node".into())),
        }
    }

    /// Plain data view of a node and its whole subtree.
    pub fn get_snapshot(&self, node: NodeId) -> TreeResult<Value> {
        self.assert_tracked(node)?;
        Ok(self.snapshot_value(&TreeValue::Node(node)))
    }

    /// Plain data view of a value. Stale handles snapshot as `null`.
    pub fn snapshot_value(&self, value: &TreeValue) -> Value {
        match value {
            TreeValue::Null => Value::Null,
            TreeValue::Bool(b) => Value::Bool(*b),
            TreeValue::Number(n) => Value::Number(n.clone()),
            TreeValue::String(s) => Value::String(s.clone()),
            TreeValue::Node(id) => match self.arena.get(*id) {
                Some(NodeData::Object(map)) => {
                    let mut out = Map::with_capacity(map.len());
                    for (k, v) in map {
                        out.insert(k.clone(), self.snapshot_value(v));
                    }
                    Value::Object(out)
                }
                Some(NodeData::Array(arr)) => {
                    Value::Array(arr.iter().map(|v| self.snapshot_value(v)).collect())
                }
                None => Value::Null,
            },
        }
    }
}
