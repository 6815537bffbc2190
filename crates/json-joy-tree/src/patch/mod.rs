//! Patches over a [`Tree`](crate::Tree): types, application, recording and
//! wire codecs.
//!
//! Only the three structural operations exist: `add`, `remove` and
//! `replace`. Each one has an exact inverse given the value it overwrote.

pub mod apply;
pub mod codec;
pub mod recorder;
pub mod types;

use serde_json::Value;

pub use apply::{apply_patch, apply_patches};
pub use codec::json::{from_json, from_json_patch, to_json, to_json_patch};
pub use recorder::{undo_events, PatchRecorder, PatchRecorderEvent};
pub use types::{Patch, PatchOp};

use crate::error::TreeResult;

/// Derives the patch that undoes `patch`; see [`Patch::invert`].
pub fn invert(patch: &Patch, pre_image: Option<&Value>) -> TreeResult<Patch> {
    patch.invert(pre_image)
}
