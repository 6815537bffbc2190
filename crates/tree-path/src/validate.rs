//! Validation functions for paths and pointers.

use crate::types::PathStep;
use crate::PathError;

/// Maximum allowed pointer string length.
const MAX_POINTER_LENGTH: usize = 1024 * 64;

/// Maximum allowed path depth. Also the default cap on parent-chain walks.
pub const MAX_PATH_LENGTH: usize = 4096;

/// Validate a JSON Pointer string.
///
/// ```
/// use json_joy_tree_path::validate_json_pointer;
///
/// validate_json_pointer("").unwrap();
/// validate_json_pointer("/foo/0").unwrap();
/// validate_json_pointer("foo").unwrap_err();
/// ```
pub fn validate_json_pointer(pointer: &str) -> Result<(), PathError> {
    if pointer.is_empty() {
        return Ok(());
    }
    if !pointer.starts_with('/') {
        return Err(PathError::PointerInvalid);
    }
    if pointer.len() > MAX_POINTER_LENGTH {
        return Err(PathError::PointerTooLong);
    }
    Ok(())
}

/// Validate a path against the default depth limit.
pub fn validate_path(path: &[PathStep]) -> Result<(), PathError> {
    validate_path_depth(path, MAX_PATH_LENGTH)
}

/// Validate a path against an explicit depth limit.
pub fn validate_path_depth(path: &[PathStep], max_depth: usize) -> Result<(), PathError> {
    if path.len() > max_depth {
        return Err(PathError::PathTooLong(path.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_paths_are_rejected() {
        let path: Vec<PathStep> = (0..10).map(PathStep::Index).collect();
        assert!(validate_path_depth(&path, 10).is_ok());
        assert_eq!(
            validate_path_depth(&path, 9),
            Err(PathError::PathTooLong(10))
        );
        assert!(validate_path(&path).is_ok());
    }
}
