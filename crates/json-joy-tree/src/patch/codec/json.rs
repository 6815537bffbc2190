//! JSON codec for tree patches.
//!
//! `{ "op": "add" | "remove" | "replace", "path": [string | number, ...], "value"?: any }`
//!
//! Paths are written as arrays. On decode a JSON Pointer string is accepted as
//! well.

use json_joy_tree_path::{path_from_value, path_to_value, Path};
use serde_json::{json, Map, Value};

use crate::error::{TreeError, TreeResult};
use crate::patch::types::{Patch, PatchOp};

// ── Serialization ─────────────────────────────────────────────────────────

pub fn to_json(patch: &Patch) -> Value {
    let mut m = Map::new();
    m.insert("op".into(), json!(patch.op().as_str()));
    m.insert("path".into(), path_to_value(patch.path()));
    if let Some(value) = patch.value() {
        m.insert("value".into(), value.clone());
    }
    Value::Object(m)
}

pub fn to_json_patch(patches: &[Patch]) -> Value {
    Value::Array(patches.iter().map(to_json).collect())
}

// ── Deserialization ───────────────────────────────────────────────────────

pub(crate) fn decode_path(v: &Value) -> TreeResult<Path> {
    path_from_value(v).map_err(|e| TreeError::InvalidPatch(format!("bad path: {e}")))
}

pub fn from_json(v: &Value) -> TreeResult<Patch> {
    let obj = v
        .as_object()
        .ok_or_else(|| TreeError::InvalidPatch("patch must be an object".into()))?;
    let op = obj
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| TreeError::InvalidPatch("missing or non-string op".into()))?;
    let op = PatchOp::from_str(op)?;
    let path = decode_path(
        obj.get("path")
            .ok_or_else(|| TreeError::InvalidPatch("missing path".into()))?,
    )?;
    let value = || {
        obj.get("value")
            .cloned()
            .ok_or_else(|| TreeError::InvalidPatch(format!("{} requires a value", op.as_str())))
    };
    Ok(match op {
        PatchOp::Add => Patch::Add { path, value: value()? },
        PatchOp::Remove => Patch::Remove { path },
        PatchOp::Replace => Patch::Replace { path, value: value()? },
    })
}

pub fn from_json_patch(v: &Value) -> TreeResult<Vec<Patch>> {
    v.as_array()
        .ok_or_else(|| TreeError::InvalidPatch("patch list must be an array".into()))?
        .iter()
        .map(from_json)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use json_joy_tree_path::PathStep;

    #[test]
    fn wire_form() {
        let patch = Patch::add(vec![PathStep::from("arr"), PathStep::Index(1)], json!(10));
        assert_eq!(to_json(&patch), json!({"op": "add", "path": ["arr", 1], "value": 10}));
        assert_eq!(
            to_json(&Patch::remove(vec![PathStep::from("a")])),
            json!({"op": "remove", "path": ["a"]})
        );
    }

    #[test]
    fn decodes_arrays_and_pointers() {
        let a = from_json(&json!({"op": "replace", "path": ["a", "0"], "value": null})).unwrap();
        let b = from_json(&json!({"op": "replace", "path": "/a/0", "value": null})).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.value(), Some(&Value::Null));
    }

    #[test]
    fn rejects_malformed_patches() {
        for bad in [
            json!(1),
            json!({"path": []}),
            json!({"op": "move", "path": []}),
            json!({"op": "add", "path": ["a"]}),
            json!({"op": "remove", "path": [true]}),
            json!({"op": "remove"}),
        ] {
            assert!(matches!(from_json(&bad), Err(TreeError::InvalidPatch(_))), "{bad}");
        }
        assert!(from_json_patch(&json!({})).is_err());
    }

    #[test]
    fn list_round_trip() {
        let list = json!([
            {"op": "add", "path": ["x"], "value": {"y": [1]}},
            {"op": "remove", "path": ["x", "y", 0]},
        ]);
        assert_eq!(to_json_patch(&from_json_patch(&list).unwrap()), list);
    }
}
