//! Patch codecs.
//!
//! - [`json`]: the object wire form `{ "op", "path", "value"? }`.
//! - [`compact`]: the array form `[opcode, path, value?]`.

pub mod compact;
pub mod json;
