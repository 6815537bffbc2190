//! json-joy-tree: a tree of JSON nodes that knows where every node lives.
//!
//! Provides:
//! - a node arena with a parent registry, so every node can answer "who is my
//!   parent" and "what is my path from the root";
//! - `add` / `remove` / `replace` patches with exact inverses, applied against
//!   a root node, plus JSON and compact codecs;
//! - patch recorders that capture every mutation with its inverse;
//! - actions and flows running under a context stack with a middleware chain;
//! - an atomic middleware that undoes everything a failed action did.
//!
//! # Example
//!
//! ```
//! use json_joy_tree::{Patch, PathStep, Tree, TreeError};
//! use serde_json::json;
//!
//! let mut tree = Tree::new();
//! let root = tree.create_root(&json!({"arr": [1, 2, 3]})).unwrap();
//! tree.apply_patches(root, &[Patch::add(vec![PathStep::from("arr"), PathStep::Index(1)], json!(10))])
//!     .unwrap();
//! assert_eq!(tree.get_snapshot(root).unwrap(), json!({"arr": [1, 10, 2, 3]}));
//!
//! tree.add_atomic_middleware(root, "edit").unwrap();
//! let result = tree.run_action(root, "edit", vec![], |tree| {
//!     tree.set(root, "extra", true)?;
//!     Err::<(), _>(TreeError::Action("nope".into()))
//! });
//! assert!(result.is_err());
//! assert_eq!(tree.get_snapshot(root).unwrap(), json!({"arr": [1, 10, 2, 3]}));
//! ```

pub mod action;
pub mod atomic;
pub mod cli;
pub mod config;
pub mod error;
pub mod node;
pub mod parent;
pub mod patch;
pub mod tree;

pub use action::{
    ActionContext, ActionMiddleware, ActionResult, ActionTrackingHooks, ActionTrackingMiddleware,
    ActionTrackingResult, ActionType, AsyncStepType, DataKey, Flow, MiddlewareHandle, Next,
};
pub use atomic::AtomicMiddleware;
pub use config::{IdentityKey, TreeConfig, DEFAULT_IDENTITY_KEY};
pub use error::{TreeError, TreeResult};
pub use json_joy_tree_path::{Path, PathError, PathStep};
pub use node::{NodeData, NodeId, NodeKind, TreeValue};
pub use parent::{ParentPath, Resolution, RootPath};
pub use patch::{apply_patches, Patch, PatchOp, PatchRecorder, PatchRecorderEvent};
pub use tree::Tree;
