//! Compact array codec for tree patches.
//!
//! Each patch is a JSON array `[opcode, path, value?]`. The opcode is numeric
//! on encode; decode accepts the string op names too.

use serde_json::{json, Value};

use super::json::decode_path;
use crate::error::{TreeError, TreeResult};
use crate::patch::types::{Patch, PatchOp};
use json_joy_tree_path::path_to_value;

pub const OPCODE_ADD: u8 = 0;
pub const OPCODE_REMOVE: u8 = 1;
pub const OPCODE_REPLACE: u8 = 2;

fn opcode(op: PatchOp) -> u8 {
    match op {
        PatchOp::Add => OPCODE_ADD,
        PatchOp::Remove => OPCODE_REMOVE,
        PatchOp::Replace => OPCODE_REPLACE,
    }
}

fn decode_opcode(v: &Value) -> TreeResult<PatchOp> {
    match v {
        Value::Number(n) => match n.as_u64() {
            Some(0) => Ok(PatchOp::Add),
            Some(1) => Ok(PatchOp::Remove),
            Some(2) => Ok(PatchOp::Replace),
            _ => Err(TreeError::InvalidPatch(format!("unknown opcode: {n}"))),
        },
        Value::String(s) => PatchOp::from_str(s),
        _ => Err(TreeError::InvalidPatch("opcode must be a number or string".into())),
    }
}

pub fn encode(patch: &Patch) -> Value {
    let mut out = vec![json!(opcode(patch.op())), path_to_value(patch.path())];
    if let Some(value) = patch.value() {
        out.push(value.clone());
    }
    Value::Array(out)
}

pub fn decode(v: &Value) -> TreeResult<Patch> {
    let arr = v
        .as_array()
        .ok_or_else(|| TreeError::InvalidPatch("compact patch must be an array".into()))?;
    let (op, path) = match arr.as_slice() {
        [op, path, ..] => (decode_opcode(op)?, decode_path(path)?),
        _ => return Err(TreeError::InvalidPatch("compact patch needs an opcode and a path".into())),
    };
    let value = || {
        arr.get(2)
            .cloned()
            .ok_or_else(|| TreeError::InvalidPatch(format!("{} requires a value", op.as_str())))
    };
    Ok(match op {
        PatchOp::Add => Patch::Add { path, value: value()? },
        PatchOp::Remove => Patch::Remove { path },
        PatchOp::Replace => Patch::Replace { path, value: value()? },
    })
}

pub fn encode_patch(patches: &[Patch]) -> Value {
    Value::Array(patches.iter().map(encode).collect())
}

pub fn decode_patch(v: &Value) -> TreeResult<Vec<Patch>> {
    v.as_array()
        .ok_or_else(|| TreeError::InvalidPatch("patch list must be an array".into()))?
        .iter()
        .map(decode)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use json_joy_tree_path::PathStep;

    #[test]
    fn encodes_numeric_opcodes() {
        let patch = Patch::replace(vec![PathStep::from("a"), PathStep::Index(2)], json!("x"));
        assert_eq!(encode(&patch), json!([2, ["a", 2], "x"]));
        assert_eq!(encode(&Patch::remove(vec![])), json!([1, []]));
    }

    #[test]
    fn decode_accepts_op_names() {
        assert_eq!(
            decode(&json!(["add", "/a", 1])).unwrap(),
            Patch::add(vec![PathStep::from("a")], json!(1))
        );
        assert!(decode(&json!([7, []])).is_err());
        assert!(decode(&json!([0, ["a"]])).is_err());
        assert!(decode(&json!([0])).is_err());
    }
}
