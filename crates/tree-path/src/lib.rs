//! Paths into a json-joy tree.
//!
//! A path is a sequence of [`PathStep`]s: property names for objects and
//! indices for arrays. Paths travel in two forms:
//!
//! - the patch wire form, a JSON array of strings and numbers
//!   (`["todos", 1, "text"]`), see [`path_to_value`] / [`path_from_value`];
//! - a JSON Pointer (RFC 6901) string (`/todos/1/text`), see
//!   [`parse_json_pointer`] / [`format_json_pointer`].
//!
//! # Example
//!
//! ```
//! use json_joy_tree_path::{format_json_pointer, parse_json_pointer, PathStep};
//!
//! let path = parse_json_pointer("/todos/1");
//! assert_eq!(path, vec![PathStep::from("todos"), PathStep::from("1")]);
//! assert_eq!(format_json_pointer(&[PathStep::from("todos"), PathStep::Index(1)]), "/todos/1");
//! ```

use serde_json::Value;
use thiserror::Error;

pub mod types;
pub use types::{Path, PathStep};

pub mod util;
pub use util::{escape_component, is_valid_index, unescape_component};

pub mod validate;
pub use validate::{validate_json_pointer, validate_path, validate_path_depth, MAX_PATH_LENGTH};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path has no parent")]
    NoParent,
    #[error("invalid path step: {0}")]
    InvalidStep(String),
    #[error("path must be an array")]
    NotAnArray,
    #[error("path too long: {0} steps")]
    PathTooLong(usize),
    #[error("POINTER_INVALID")]
    PointerInvalid,
    #[error("POINTER_TOO_LONG")]
    PointerTooLong,
}

/// Parse a JSON Pointer string into path steps.
///
/// Every step comes back as a [`PathStep::Key`]; numeric keys still address
/// array elements when resolved.
///
/// ```
/// use json_joy_tree_path::{parse_json_pointer, PathStep};
///
/// assert!(parse_json_pointer("").is_empty());
/// assert_eq!(parse_json_pointer("/"), vec![PathStep::from("")]);
/// assert_eq!(parse_json_pointer("/a~0b/c~1d"), vec![PathStep::from("a~b"), PathStep::from("c/d")]);
/// ```
pub fn parse_json_pointer(pointer: &str) -> Path {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer[1..]
        .split('/')
        .map(|c| PathStep::Key(unescape_component(c).into_owned()))
        .collect()
}

/// Format path steps into a JSON Pointer string.
pub fn format_json_pointer(path: &[PathStep]) -> String {
    if path.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    for step in path {
        out.push('/');
        out.push_str(&escape_component(&step.as_key()));
    }
    out
}

/// Encode a path in the patch wire form.
pub fn path_to_value(path: &[PathStep]) -> Value {
    Value::Array(path.iter().map(PathStep::to_value).collect())
}

/// Decode a path from the patch wire form.
///
/// A JSON Pointer string is accepted as well, for compatibility with RFC 6902
/// documents.
pub fn path_from_value(value: &Value) -> Result<Path, PathError> {
    match value {
        Value::Array(steps) => steps.iter().map(PathStep::from_value).collect(),
        Value::String(pointer) => {
            validate_json_pointer(pointer)?;
            Ok(parse_json_pointer(pointer))
        }
        _ => Err(PathError::NotAnArray),
    }
}

/// Check if a path points to the root value.
pub fn is_root(path: &[PathStep]) -> bool {
    path.is_empty()
}

/// Check if `parent` path strictly contains the `child` path.
///
/// ```
/// use json_joy_tree_path::{is_child, PathStep};
///
/// let parent = vec![PathStep::from("arr")];
/// let child = vec![PathStep::from("arr"), PathStep::Index(0)];
/// assert!(is_child(&parent, &child));
/// assert!(!is_child(&child, &parent));
/// ```
pub fn is_child(parent: &[PathStep], child: &[PathStep]) -> bool {
    if parent.len() >= child.len() {
        return false;
    }
    parent.iter().zip(child).all(|(a, b)| a.same_slot(b))
}

/// Check if two paths address the same location.
pub fn is_path_equal(p1: &[PathStep], p2: &[PathStep]) -> bool {
    p1.len() == p2.len() && p1.iter().zip(p2).all(|(a, b)| a.same_slot(b))
}

/// Get the parent path of a given path.
pub fn parent(path: &[PathStep]) -> Result<Path, PathError> {
    if path.is_empty() {
        return Err(PathError::NoParent);
    }
    Ok(path[..path.len() - 1].to_vec())
}
