//! Error type shared by every tree operation.

use json_joy_tree_path::{Path, PathError};
use thiserror::Error;

use crate::node::NodeId;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TreeError {
    /// The handle does not refer to a live node of this tree.
    #[error("{0} is not a tracked node")]
    NotATrackedNode(NodeId),
    /// A patch path does not resolve through existing containers.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: Path, reason: String },
    #[error("index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },
    /// Middleware misconfiguration.
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    /// An inverse patch failed while undoing an atomic action.
    #[error("rollback failed after `{original}`: {source}")]
    RollbackFailure {
        original: Box<TreeError>,
        source: Box<TreeError>,
    },
    #[error("{0} already has a parent")]
    AlreadyAttached(NodeId),
    #[error("attaching {child} under {parent} would create a cycle")]
    CycleDetected { parent: NodeId, child: NodeId },
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("invalid patch: {0}")]
    InvalidPatch(String),
    #[error(transparent)]
    Path(#[from] PathError),
    /// Failure raised by user action code.
    #[error("action failed: {0}")]
    Action(String),
}

impl TreeError {
    pub(crate) fn invalid_path(path: &[json_joy_tree_path::PathStep], reason: impl Into<String>) -> Self {
        TreeError::InvalidPath {
            path: path.to_vec(),
            reason: reason.into(),
        }
    }

    /// The action error that started a failed rollback, or `self`.
    pub fn original(&self) -> &TreeError {
        match self {
            TreeError::RollbackFailure { original, .. } => original,
            other => other,
        }
    }
}

pub type TreeResult<T> = Result<T, TreeError>;
