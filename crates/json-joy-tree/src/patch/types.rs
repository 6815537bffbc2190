//! Core types for tree patches.

use json_joy_tree_path::Path;
use serde_json::Value;

use crate::error::{TreeError, TreeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
}

impl PatchOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchOp::Add => "add",
            PatchOp::Remove => "remove",
            PatchOp::Replace => "replace",
        }
    }

    pub fn from_str(s: &str) -> TreeResult<Self> {
        match s {
            "add" => Ok(PatchOp::Add),
            "remove" => Ok(PatchOp::Remove),
            "replace" => Ok(PatchOp::Replace),
            other => Err(TreeError::InvalidPatch(format!("unknown op: {other}"))),
        }
    }
}

/// A single structural edit. Values are plain snapshot data.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    Add { path: Path, value: Value },
    Remove { path: Path },
    Replace { path: Path, value: Value },
}

impl Patch {
    pub fn add(path: impl Into<Path>, value: Value) -> Self {
        Patch::Add {
            path: path.into(),
            value,
        }
    }

    pub fn remove(path: impl Into<Path>) -> Self {
        Patch::Remove { path: path.into() }
    }

    pub fn replace(path: impl Into<Path>, value: Value) -> Self {
        Patch::Replace {
            path: path.into(),
            value,
        }
    }

    pub fn op(&self) -> PatchOp {
        match self {
            Patch::Add { .. } => PatchOp::Add,
            Patch::Remove { .. } => PatchOp::Remove,
            Patch::Replace { .. } => PatchOp::Replace,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Patch::Add { path, .. } | Patch::Remove { path } | Patch::Replace { path, .. } => path,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Patch::Add { value, .. } | Patch::Replace { value, .. } => Some(value),
            Patch::Remove { .. } => None,
        }
    }

    /// Same edit, rooted `prefix` levels higher.
    pub fn with_prefix(&self, prefix: &[json_joy_tree_path::PathStep]) -> Patch {
        let mut full = prefix.to_vec();
        full.extend(self.path().iter().cloned());
        match self {
            Patch::Add { value, .. } => Patch::Add { path: full, value: value.clone() },
            Patch::Remove { .. } => Patch::Remove { path: full },
            Patch::Replace { value, .. } => Patch::Replace { path: full, value: value.clone() },
        }
    }

    /// Derives the patch that undoes `self`.
    ///
    /// `pre_image` is the value held at the path before `self` was applied;
    /// `remove` and `replace` need it, `add` does not.
    pub fn invert(&self, pre_image: Option<&Value>) -> TreeResult<Patch> {
        match self {
            Patch::Add { path, .. } => Ok(Patch::Remove { path: path.clone() }),
            Patch::Remove { path } => {
                let value = pre_image.cloned().ok_or_else(|| {
                    TreeError::InvalidPatch("inverting remove needs the removed value".into())
                })?;
                Ok(Patch::Add { path: path.clone(), value })
            }
            Patch::Replace { path, .. } => {
                let value = pre_image.cloned().ok_or_else(|| {
                    TreeError::InvalidPatch("inverting replace needs the replaced value".into())
                })?;
                Ok(Patch::Replace { path: path.clone(), value })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use json_joy_tree_path::PathStep;
    use serde_json::json;

    fn p(steps: &[&str]) -> Path {
        steps.iter().map(|s| PathStep::from(*s)).collect()
    }

    #[test]
    fn inversion_rules() {
        let add = Patch::add(p(&["a"]), json!(1));
        assert_eq!(add.invert(None).unwrap(), Patch::remove(p(&["a"])));

        let remove = Patch::remove(p(&["a"]));
        assert_eq!(remove.invert(Some(&json!(2))).unwrap(), Patch::add(p(&["a"]), json!(2)));
        assert!(remove.invert(None).is_err());

        let replace = Patch::replace(p(&["a"]), json!(3));
        assert_eq!(
            replace.invert(Some(&json!(2))).unwrap(),
            Patch::replace(p(&["a"]), json!(2))
        );
    }

    #[test]
    fn prefixing_keeps_op_and_value() {
        let patch = Patch::replace(vec![PathStep::Index(0)], json!("x"));
        let moved = patch.with_prefix(&[PathStep::from("arr")]);
        assert_eq!(moved.op(), PatchOp::Replace);
        assert_eq!(moved.path(), &vec![PathStep::from("arr"), PathStep::Index(0)]);
        assert_eq!(moved.value(), Some(&json!("x")));
    }

    #[test]
    fn op_names() {
        for op in [PatchOp::Add, PatchOp::Remove, PatchOp::Replace] {
            assert_eq!(PatchOp::from_str(op.as_str()).unwrap(), op);
        }
        assert!(PatchOp::from_str("move").is_err());
    }
}
