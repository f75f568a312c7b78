//! Single-mutation filesystem primitives.
//!
//! Each function performs one logical mutation and reports it as a
//! [`SpecCopyOutcome`]; errors are never returned through `?` to the caller.
//! On failure the destination is left in whatever state the failed call
//! produced.

use std::fs;
use std::io;
use std::path::Path;

use filetime::{FileTime, set_file_times};
use tracing::debug;

use crate::probe;
use crate::spec::{EnumCopyErrorKind, SpecCopyError, SpecCopyOutcome};

/// Create `path_dst` (and any missing parents) and copy the timestamps of
/// `path_src_meta` onto it.
///
/// An already existing directory is reused. In dry-run mode nothing is touched
/// and the outcome is successful.
pub fn create_directory(
    path_dst: &Path,
    path_src_meta: &Path,
    if_dry_run: bool,
) -> SpecCopyOutcome {
    if if_dry_run {
        return SpecCopyOutcome::success(path_src_meta, path_dst);
    }

    if let Err(e) = fs::create_dir_all(path_dst) {
        return SpecCopyOutcome::failure(path_src_meta, path_dst, SpecCopyError::from(e));
    }
    if !probe::exists(path_dst) {
        return SpecCopyOutcome::failure(
            path_src_meta,
            path_dst,
            SpecCopyError::new(
                EnumCopyErrorKind::ConsistencyViolation,
                format!("Directory is absent after creation: {}", path_dst.display()),
            ),
        );
    }
    let res_times =
        fs::metadata(path_src_meta).and_then(|stat_src| apply_times(&stat_src, path_dst));
    if let Err(e) = res_times {
        return SpecCopyOutcome::failure(path_src_meta, path_dst, SpecCopyError::from(e));
    }

    SpecCopyOutcome::success(path_src_meta, path_dst)
}

/// Copy one file, replacing any existing destination, then its metadata.
///
/// Metadata is best-effort against permission problems: a `PermissionDenied`
/// while applying it is logged and the copy still counts as successful.
pub fn copy_file(path_src: &Path, path_dst: &Path, if_dry_run: bool) -> SpecCopyOutcome {
    if !probe::is_file(path_src) {
        return SpecCopyOutcome::failure(
            path_src,
            path_dst,
            SpecCopyError::new(
                EnumCopyErrorKind::ConsistencyViolation,
                format!("Source file vanished before copy: {}", path_src.display()),
            ),
        );
    }
    if if_dry_run {
        return SpecCopyOutcome::success(path_src, path_dst);
    }

    if let Err(e) = delete_file(path_dst) {
        return SpecCopyOutcome::failure(path_src, path_dst, SpecCopyError::from(e));
    }
    if let Err(e) = fs::copy(path_src, path_dst) {
        return SpecCopyOutcome::failure(path_src, path_dst, SpecCopyError::from(e));
    }

    match copy_metadata(path_src, path_dst) {
        Ok(()) => SpecCopyOutcome::success(path_src, path_dst),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            debug!(
                path = %path_dst.display(),
                error = %e,
                "Metadata not copied (permission denied)"
            );
            SpecCopyOutcome::success(path_src, path_dst)
        }
        Err(e) => SpecCopyOutcome::failure(path_src, path_dst, SpecCopyError::from(e)),
    }
}

/// Remove the file at `path`. Absent paths are not an error.
pub fn delete_file(path: &Path) -> Result<(), io::Error> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        res => res,
    }
}

/// Copy timestamps, permissions and (on Linux) extended attributes.
pub fn copy_metadata(path_src: &Path, path_dst: &Path) -> Result<(), io::Error> {
    let stat_src = fs::metadata(path_src)?;
    apply_times(&stat_src, path_dst)?;
    // Permissions last: a read-only mode must not block the timestamp update.
    fs::set_permissions(path_dst, stat_src.permissions())?;

    #[cfg(target_os = "linux")]
    {
        copy_xattrs_linux(path_src, path_dst);
    }
    Ok(())
}

fn apply_times(stat_src: &fs::Metadata, path_dst: &Path) -> Result<(), io::Error> {
    let file_time_access = FileTime::from_last_access_time(stat_src);
    let file_time_modify = FileTime::from_last_modification_time(stat_src);
    set_file_times(path_dst, file_time_access, file_time_modify)
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_src: &Path, path_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_src) {
        Ok(v) => v,
        Err(e) => {
            debug!(path = %path_src.display(), error = %e, "Extended attributes not listed");
            return;
        }
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_src, &name).ok().flatten() else {
            continue;
        };
        if let Err(e) = xattr::set(path_dst, &name, &raw_value) {
            debug!(
                path = %path_dst.display(),
                name = ?name,
                error = %e,
                "Extended attribute not copied"
            );
        }
    }
}
