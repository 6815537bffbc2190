//! Type definitions for tree paths.

use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

use crate::util::is_valid_index;
use crate::PathError;

/// A step in a tree path.
///
/// Object properties are addressed by [`PathStep::Key`], array elements by
/// [`PathStep::Index`]. A key made of decimal digits (`"1"`) addresses the same
/// array slot as the matching index (`1`), but the two are kept apart so a path
/// is echoed back exactly as it was given. Use [`PathStep::same_slot`] when the
/// question is "do these address the same element".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

/// A path from some node down to a descendant.
pub type Path = Vec<PathStep>;

impl PathStep {
    /// Returns the array index this step denotes, if any.
    ///
    /// ```
    /// use json_joy_tree_path::PathStep;
    ///
    /// assert_eq!(PathStep::Index(3).as_index(), Some(3));
    /// assert_eq!(PathStep::from("3").as_index(), Some(3));
    /// assert_eq!(PathStep::from("03").as_index(), None);
    /// assert_eq!(PathStep::from("x").as_index(), None);
    /// ```
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathStep::Index(i) => Some(*i),
            PathStep::Key(k) if is_valid_index(k) => k.parse().ok(),
            PathStep::Key(_) => None,
        }
    }

    /// Returns the step as an object property name.
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            PathStep::Key(k) => Cow::Borrowed(k.as_str()),
            PathStep::Index(i) => Cow::Owned(i.to_string()),
        }
    }

    /// Whether two steps address the same slot, regardless of representation.
    pub fn same_slot(&self, other: &PathStep) -> bool {
        match (self, other) {
            (PathStep::Key(a), PathStep::Key(b)) => a == b,
            _ => match (self.as_index(), other.as_index()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, PathStep::Index(_))
    }

    /// Encodes the step for the wire format: keys as strings, indices as numbers.
    pub fn to_value(&self) -> Value {
        match self {
            PathStep::Key(k) => Value::String(k.clone()),
            PathStep::Index(i) => Value::from(*i),
        }
    }

    /// Decodes a wire-format step. Only strings and non-negative integers are accepted.
    pub fn from_value(value: &Value) -> Result<Self, PathError> {
        match value {
            Value::String(s) => Ok(PathStep::Key(s.clone())),
            Value::Number(n) => n
                .as_u64()
                .and_then(|i| usize::try_from(i).ok())
                .map(PathStep::Index)
                .ok_or_else(|| PathError::InvalidStep(n.to_string())),
            other => Err(PathError::InvalidStep(other.to_string())),
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Key(k) => f.write_str(k),
            PathStep::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PathStep {
    fn from(key: &str) -> Self {
        PathStep::Key(key.to_string())
    }
}

impl From<String> for PathStep {
    fn from(key: String) -> Self {
        PathStep::Key(key)
    }
}

impl From<usize> for PathStep {
    fn from(index: usize) -> Self {
        PathStep::Index(index)
    }
}

impl From<&PathStep> for PathStep {
    fn from(step: &PathStep) -> Self {
        step.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_key_and_index_share_a_slot() {
        let key = PathStep::from("1");
        let idx = PathStep::Index(1);
        assert!(key.same_slot(&idx));
        assert!(idx.same_slot(&key));
        assert_ne!(key, idx);
    }

    #[test]
    fn non_numeric_keys_never_match_indices() {
        assert!(!PathStep::from("a").same_slot(&PathStep::Index(0)));
        assert!(!PathStep::from("-1").same_slot(&PathStep::Index(1)));
    }

    #[test]
    fn wire_representation_is_preserved() {
        assert_eq!(PathStep::from("2").to_value(), json!("2"));
        assert_eq!(PathStep::Index(2).to_value(), json!(2));
        assert_eq!(PathStep::from_value(&json!(2)).unwrap(), PathStep::Index(2));
        assert_eq!(
            PathStep::from_value(&json!("2")).unwrap(),
            PathStep::Key("2".into())
        );
    }

    #[test]
    fn rejects_negative_and_fractional_steps() {
        assert!(PathStep::from_value(&json!(-1)).is_err());
        assert!(PathStep::from_value(&json!(1.5)).is_err());
        assert!(PathStep::from_value(&json!(null)).is_err());
    }
}
