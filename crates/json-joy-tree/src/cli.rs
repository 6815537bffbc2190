//! Core logic of the `json-tree-patch` binary.
//!
//! The document is loaded into a fresh [`Tree`], the patch list is decoded
//! with the JSON codec and applied, and the result is serialized back.

use serde_json::Value;
use thiserror::Error;

use crate::error::TreeError;
use crate::patch::{from_json_patch, to_json_patch, Patch};
use crate::tree::Tree;

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Tree(#[from] TreeError),
}

// ── json-tree-patch ───────────────────────────────────────────────────────

/// Applies a patch list (JSON text) to a document (JSON text) and returns the
/// patched document.
pub fn apply_json_patch(doc: &str, patch: &str) -> Result<String, CliError> {
    let (mut tree, root, patches) = load(doc, patch)?;
    tree.apply_patches(root, &patches)?;
    Ok(serde_json::to_string(&tree.get_snapshot(root)?)?)
}

/// Applies a patch list to a document and returns the patch list that undoes
/// it, in application order.
pub fn inverse_json_patch(doc: &str, patch: &str) -> Result<String, CliError> {
    let (mut tree, root, patches) = load(doc, patch)?;
    let recorder = tree.patch_recorder(true);
    tree.apply_patches(root, &patches)?;
    let inverse: Vec<Patch> = recorder
        .take_events()
        .into_iter()
        .rev()
        .flat_map(|event| event.inverse_patches.into_iter().rev())
        .collect();
    recorder.dispose();
    Ok(serde_json::to_string(&to_json_patch(&inverse))?)
}

fn load(doc: &str, patch: &str) -> Result<(Tree, crate::node::NodeId, Vec<Patch>), CliError> {
    let doc: Value = serde_json::from_str(doc)?;
    let patch: Value = serde_json::from_str(patch)?;
    let patches = from_json_patch(&patch)?;
    let mut tree = Tree::new();
    let root = tree.create_root(&doc)?;
    Ok((tree, root, patches))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_and_inverts() {
        let doc = r#"{"arr":[1,2,3]}"#;
        let patch = r#"[{"op":"add","path":["arr",1],"value":10},{"op":"remove","path":"/arr/0"}]"#;
        assert_eq!(apply_json_patch(doc, patch).unwrap(), r#"{"arr":[10,2,3]}"#);

        let inverse = inverse_json_patch(doc, patch).unwrap();
        assert_eq!(apply_json_patch(r#"{"arr":[10,2,3]}"#, &inverse).unwrap(), doc);
    }

    #[test]
    fn reports_bad_input() {
        assert!(matches!(apply_json_patch("{", "[]"), Err(CliError::Json(_))));
        assert!(matches!(apply_json_patch("1", "[]"), Err(CliError::Tree(_))));
        assert!(matches!(
            apply_json_patch("{}", r#"[{"op":"move","path":[]}]"#),
            Err(CliError::Tree(TreeError::InvalidPatch(_)))
        ));
    }
}
