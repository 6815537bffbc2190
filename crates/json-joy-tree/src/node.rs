//! Tree nodes and the arena that owns them.
//!
//! Objects and arrays live in an [`Arena`] and are referred to by [`NodeId`]
//! handles; primitives are stored inline in [`TreeValue`]. Node identity is
//! handle identity: two handles are the same node iff they compare equal.

use std::fmt;

use indexmap::IndexMap;
use serde_json::{Number, Value};

/// Stable handle to a node.
///
/// The generation guards against a disposed slot being reused: a stale handle
/// never resolves to the node that took its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}.{}", self.index, self.generation)
    }
}

/// A value held in an object property or array slot.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Node(NodeId),
}

impl TreeValue {
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            TreeValue::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, TreeValue::Node(_))
    }

    /// Converts a primitive JSON value. Objects and arrays need a tree to be
    /// materialized into and yield `None`.
    pub fn from_primitive(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(TreeValue::Null),
            Value::Bool(b) => Some(TreeValue::Bool(*b)),
            Value::Number(n) => Some(TreeValue::Number(n.clone())),
            Value::String(s) => Some(TreeValue::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl From<bool> for TreeValue {
    fn from(b: bool) -> Self {
        TreeValue::Bool(b)
    }
}

impl From<i32> for TreeValue {
    fn from(n: i32) -> Self {
        TreeValue::Number(n.into())
    }
}

impl From<i64> for TreeValue {
    fn from(n: i64) -> Self {
        TreeValue::Number(n.into())
    }
}

impl From<u64> for TreeValue {
    fn from(n: u64) -> Self {
        TreeValue::Number(n.into())
    }
}

impl From<&str> for TreeValue {
    fn from(s: &str) -> Self {
        TreeValue::String(s.to_string())
    }
}

impl From<String> for TreeValue {
    fn from(s: String) -> Self {
        TreeValue::String(s)
    }
}

impl From<NodeId> for TreeValue {
    fn from(id: NodeId) -> Self {
        TreeValue::Node(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
}

/// Contents of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Object(IndexMap<String, TreeValue>),
    Array(Vec<TreeValue>),
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Object(_) => NodeKind::Object,
            NodeData::Array(_) => NodeKind::Array,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            NodeData::Object(map) => map.len(),
            NodeData::Array(arr) => arr.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates every value held directly by this node.
    pub fn values(&self) -> Box<dyn Iterator<Item = &TreeValue> + '_> {
        match self {
            NodeData::Object(map) => Box::new(map.values()),
            NodeData::Array(arr) => Box::new(arr.iter()),
        }
    }

    /// Handles of the direct child nodes.
    pub fn child_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.values().filter_map(TreeValue::as_node)
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

/// Generational slot arena for nodes.
#[derive(Debug, Default)]
pub(crate) struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Arena {
    /// # Panics
    ///
    /// Panics when every `u32` slot index is in use.
    pub fn alloc(&mut self, data: NodeData) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.data = Some(data);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let Ok(index) = u32::try_from(self.slots.len()) else {
            tracing::error!(slots = self.slots.len(), "node arena exhausted");
            panic!("node arena exhausted: no free slot index left");
        };
        self.slots.push(Slot {
            generation: 0,
            data: Some(data),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.data.as_ref()
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.data.as_mut()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Frees a slot; the handle and every copy of it become stale.
    pub fn free(&mut self, id: NodeId) -> Option<NodeData> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let data = slot.data.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(data)
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.data.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freed_handles_go_stale() {
        let mut arena = Arena::default();
        let a = arena.alloc(NodeData::Array(vec![]));
        assert!(arena.contains(a));
        assert!(arena.free(a).is_some());
        assert!(!arena.contains(a));

        let b = arena.alloc(NodeData::Object(IndexMap::new()));
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert!(arena.get(a).is_none());
        assert_eq!(arena.get(b).map(NodeData::kind), Some(NodeKind::Object));
        assert_eq!(arena.live_count(), 1);
    }

    #[test]
    fn primitive_conversion() {
        assert_eq!(
            TreeValue::from_primitive(&serde_json::json!("x")),
            Some(TreeValue::from("x"))
        );
        assert_eq!(TreeValue::from_primitive(&serde_json::json!({})), None);
    }
}
