//! File system helpers (raw readers, file name handling)
use std::fs;
use std::path::Path;

use super::errors::{ConvertError, ConvertResult};

/// Read a file as raw bytes. Encoding decisions are left to the caller.
pub fn read_file_bytes(path: &Path) -> ConvertResult<Vec<u8>> {
    fs::read(path).map_err(|e| ConvertError::read(path, e))
}

/// Base name of a path that may use either `/` or `\` separators.
pub fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
}
