//! Parent registry.
//!
//! Side-table from a child node to the single [`ParentPath`] that connects it
//! to its parent. A node without an entry is a root. Entries are written only
//! through [`Tree::attach_to_parent`] / [`Tree::detach_from_parent`], at the
//! same moment the child is stored into or taken out of its parent.

mod path;

pub use path::Resolution;

use json_joy_tree_path::{Path, PathStep};

use crate::node::NodeId;
use crate::tree::Tree;

/// Path from a node to its immediate parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentPath {
    pub parent: NodeId,
    /// Property name (object parent) or index (array parent).
    pub path: PathStep,
}

/// Path from a node up to its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootPath {
    pub root: NodeId,
    /// Steps from `root` down to the node; empty when the node is the root.
    pub path: Path,
}

impl Tree {
    pub(crate) fn attach_to_parent(&mut self, child: NodeId, parent_path: ParentPath) {
        tracing::trace!(%child, parent = %parent_path.parent, step = %parent_path.path, "attach");
        self.parents.insert(child, parent_path);
    }

    pub(crate) fn detach_from_parent(&mut self, child: NodeId) -> Option<ParentPath> {
        let old = self.parents.remove(&child);
        if let Some(pp) = &old {
            tracing::trace!(%child, parent = %pp.parent, "detach");
        }
        old
    }

    /// Re-keys the entry of an array child whose index shifted.
    pub(crate) fn reindex_child(&mut self, child: NodeId, parent: NodeId, index: usize) {
        if let Some(pp) = self.parents.get_mut(&child) {
            if pp.parent == parent {
                pp.path = PathStep::Index(index);
            }
        }
    }
}
