//! Tree runtime options.

use indexmap::IndexMap;
use json_joy_tree_path::MAX_PATH_LENGTH;
use serde_json::Value;

use crate::node::TreeValue;

/// Default name of the property carrying a node's identity.
pub const DEFAULT_IDENTITY_KEY: &str = "$modelId";

/// Names the embedded identity property of object nodes and snapshots.
///
/// `replace` keeps a node (and every handle to it) when the incoming value
/// carries the same identity as the node currently in the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identity embedded in a plain snapshot value.
    pub fn of_value<'a>(&self, value: &'a Value) -> Option<&'a str> {
        value.as_object()?.get(&self.0)?.as_str()
    }

    /// Identity stored in an object node's properties.
    pub fn of_props<'a>(&self, props: &'a IndexMap<String, TreeValue>) -> Option<&'a str> {
        match props.get(&self.0)? {
            TreeValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Default for IdentityKey {
    fn default() -> Self {
        Self(DEFAULT_IDENTITY_KEY.to_string())
    }
}

/// Options for a [`Tree`](crate::Tree).
#[derive(Debug, Clone)]
pub struct TreeConfig {
    pub identity_key: IdentityKey,
    /// Maximum number of steps in a patch path.
    pub max_depth: usize,
    /// Validate action targets before running actions.
    pub check_targets: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            identity_key: IdentityKey::default(),
            max_depth: MAX_PATH_LENGTH,
            check_targets: true,
        }
    }
}

impl TreeConfig {
    pub fn with_identity_key(mut self, key: impl Into<String>) -> Self {
        self.identity_key = IdentityKey::new(key);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_check_targets(mut self, check: bool) -> Self {
        self.check_targets = check;
        self
    }
}
