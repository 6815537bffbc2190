//! The tree runtime.
//!
//! A [`Tree`] owns every node, the parent registry side-table, the live patch
//! recorders, the registered action middlewares and the current action
//! context. Nothing here is process-global: two trees never observe each
//! other.

mod mutate;
mod snapshot;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::action::context::ActionContext;
use crate::action::middleware::MiddlewareRegistry;
use crate::config::TreeConfig;
use crate::error::{TreeError, TreeResult};
use crate::node::{Arena, NodeData, NodeId, NodeKind, TreeValue};
use crate::parent::ParentPath;
use crate::patch::recorder::RecorderState;

pub struct Tree {
    pub(crate) arena: Arena,
    pub(crate) parents: HashMap<NodeId, ParentPath>,
    pub(crate) recorders: Vec<Weak<RefCell<RecorderState>>>,
    pub(crate) middlewares: MiddlewareRegistry,
    pub(crate) current_context: Option<Rc<ActionContext>>,
    config: TreeConfig,
}

impl Tree {
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            arena: Arena::default(),
            parents: HashMap::new(),
            recorders: Vec::new(),
            middlewares: MiddlewareRegistry::default(),
            current_context: None,
            config,
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    // ── Node access ───────────────────────────────────────────────────────

    pub fn is_tracked(&self, node: NodeId) -> bool {
        self.arena.contains(node)
    }

    pub(crate) fn assert_tracked(&self, node: NodeId) -> TreeResult<()> {
        if self.arena.contains(node) {
            Ok(())
        } else {
            Err(TreeError::NotATrackedNode(node))
        }
    }

    pub(crate) fn data(&self, node: NodeId) -> TreeResult<&NodeData> {
        self.arena.get(node).ok_or(TreeError::NotATrackedNode(node))
    }

    pub(crate) fn data_mut(&mut self, node: NodeId) -> TreeResult<&mut NodeData> {
        self.arena.get_mut(node).ok_or(TreeError::NotATrackedNode(node))
    }

    pub fn kind(&self, node: NodeId) -> TreeResult<NodeKind> {
        Ok(self.data(node)?.kind())
    }

    /// Number of properties (objects) or elements (arrays).
    pub fn len(&self, node: NodeId) -> TreeResult<usize> {
        Ok(self.data(node)?.len())
    }

    /// Property value of an object node, or element of an array node when
    /// `key` denotes an index.
    pub fn get(&self, node: NodeId, key: &str) -> TreeResult<Option<&TreeValue>> {
        Ok(match self.data(node)? {
            NodeData::Object(map) => map.get(key),
            NodeData::Array(arr) => json_joy_tree_path::PathStep::from(key)
                .as_index()
                .and_then(|i| arr.get(i)),
        })
    }

    pub fn get_index(&self, node: NodeId, index: usize) -> TreeResult<Option<&TreeValue>> {
        Ok(match self.data(node)? {
            NodeData::Array(arr) => arr.get(index),
            NodeData::Object(map) => map.get(&index.to_string()),
        })
    }

    /// Property names of an object node in insertion order; empty for arrays.
    pub fn keys(&self, node: NodeId) -> TreeResult<Vec<String>> {
        Ok(match self.data(node)? {
            NodeData::Object(map) => map.keys().cloned().collect(),
            NodeData::Array(_) => Vec::new(),
        })
    }

    pub fn props(&self, node: NodeId) -> TreeResult<Option<&IndexMap<String, TreeValue>>> {
        Ok(match self.data(node)? {
            NodeData::Object(map) => Some(map),
            NodeData::Array(_) => None,
        })
    }

    /// Identity embedded in an object node under the configured identity key.
    pub fn node_identity(&self, node: NodeId) -> Option<&str> {
        match self.arena.get(node)? {
            NodeData::Object(map) => self.config.identity_key.of_props(map),
            NodeData::Array(_) => None,
        }
    }

    pub fn node_count(&self) -> usize {
        self.arena.live_count()
    }

    /// Frees a root node and its whole subtree. Every handle into the subtree
    /// becomes stale.
    pub fn dispose(&mut self, root: NodeId) -> TreeResult<()> {
        self.assert_tracked(root)?;
        if self.fast_get_parent_path(root).is_some() {
            return Err(TreeError::InvalidTarget(format!(
                "{root} is attached; detach it before disposing"
            )));
        }
        let mut stack = vec![root];
        let mut freed = HashSet::new();
        while let Some(id) = stack.pop() {
            self.detach_from_parent(id);
            if let Some(data) = self.arena.free(id) {
                stack.extend(data.child_nodes());
                freed.insert(id);
            }
        }
        self.middlewares.forget_roots(&freed);
        tracing::debug!(%root, freed = freed.len(), "disposed subtree");
        Ok(())
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &self.arena.live_count())
            .field("attached", &self.parents.len())
            .field("recorders", &self.recorders.len())
            .field("config", &self.config)
            .finish()
    }
}
