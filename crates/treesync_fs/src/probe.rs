//! Read-only path classification.
//!
//! None of these functions return errors: a path that cannot be inspected is
//! reported as absent or as "not of that type".

use std::fs;
use std::path::Path;

/// `true` if `path` resolves (following links) to a regular file or directory.
pub fn exists(path: &Path) -> bool {
    if path.as_os_str().is_empty() {
        return false;
    }
    match fs::metadata(path) {
        Ok(meta) => meta.is_file() || meta.is_dir(),
        Err(_) => false,
    }
}

/// `true` if `path` exists and is not a directory.
pub fn is_file(path: &Path) -> bool {
    if !exists(path) {
        return false;
    }
    fs::metadata(path).is_ok_and(|meta| !meta.is_dir())
}

/// `true` if `path` exists, is a directory and is not itself a symbolic link.
///
/// Links to directories are never folders: descending into them could loop or
/// copy the same subtree twice.
pub fn is_folder(path: &Path) -> bool {
    if !exists(path) {
        return false;
    }
    fs::metadata(path).is_ok_and(|meta| meta.is_dir()) && !is_symlink(path)
}

/// `true` if `path` exists and the entry itself is a symbolic link.
pub fn is_symlink(path: &Path) -> bool {
    if !exists(path) {
        return false;
    }
    fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink())
}
