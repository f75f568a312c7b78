//! Lazy depth-first directory traversal.
//!
//! [`WalkTree`] keeps an explicit stack of directory frames instead of
//! recursing. A frame lists its directory only when the consumer first pulls
//! from it, so abandoning the iterator abandons all pending work.
//!
//! Per directory the walker yields files first, then each subdirectory
//! followed by that subdirectory's own contents (pre-order). Entries are
//! name-sorted within each group. Listing failures are logged and treated as
//! an empty listing; no error ever leaves the iterator.

use std::fs;
use std::path::{Path, PathBuf};
use std::vec;

use tracing::warn;

use crate::probe::is_folder;

/// Which entries a [`WalkTree`] yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumWalkMode {
    /// Files and directories.
    All,
    /// Directories only; files are never listed.
    DirectoriesOnly,
    /// Files only; directories are descended into but not yielded.
    FilesOnly,
}

/// Include predicate used by the unfiltered walkers.
pub type FnInclude = fn(&Path) -> bool;

pub(crate) fn include_everything(_path: &Path) -> bool {
    true
}

#[derive(Debug)]
struct SpecDirListing {
    l_files: vec::IntoIter<PathBuf>,
    l_dirs: vec::IntoIter<PathBuf>,
}

#[derive(Debug)]
struct SpecWalkFrame {
    path_dir: PathBuf,
    listing: Option<SpecDirListing>,
}

impl SpecWalkFrame {
    fn new(path_dir: PathBuf) -> Self {
        Self {
            path_dir,
            listing: None,
        }
    }
}

/// Depth-first iterator over the absolute paths below one directory.
#[derive(Debug)]
pub struct WalkTree<F = FnInclude> {
    enum_mode: EnumWalkMode,
    fn_include: F,
    l_stack: Vec<SpecWalkFrame>,
}

impl<F> WalkTree<F>
where
    F: FnMut(&Path) -> bool,
{
    pub fn new<P: AsRef<Path>>(dir: P, enum_mode: EnumWalkMode, fn_include: F) -> Self {
        Self {
            enum_mode,
            fn_include,
            l_stack: vec![SpecWalkFrame::new(dir.as_ref().to_path_buf())],
        }
    }

    /// Number of directories currently open on the traversal stack.
    pub fn depth(&self) -> usize {
        self.l_stack.len()
    }
}

impl<F> Iterator for WalkTree<F>
where
    F: FnMut(&Path) -> bool,
{
    type Item = PathBuf;

    fn next(&mut self) -> Option<Self::Item> {
        let enum_mode = self.enum_mode;
        loop {
            let frame = self.l_stack.last_mut()?;
            if frame.listing.is_none() {
                frame.listing = Some(list_directory(&frame.path_dir, enum_mode));
            }
            let Some(listing) = frame.listing.as_mut() else {
                continue;
            };

            if let Some(path_file) = listing.l_files.next() {
                if (self.fn_include)(&path_file) {
                    return Some(path_file);
                }
                continue;
            }

            let Some(path_dir) = listing.l_dirs.next() else {
                self.l_stack.pop();
                continue;
            };
            let b_should_yield =
                enum_mode != EnumWalkMode::FilesOnly && (self.fn_include)(&path_dir);
            if is_folder(&path_dir) {
                self.l_stack.push(SpecWalkFrame::new(path_dir.clone()));
            }
            if b_should_yield {
                return Some(path_dir);
            }
        }
    }
}

/// Walk files and directories under `dir`, yielding those `fn_include` accepts.
///
/// `fn_include` only filters what is yielded; every real subdirectory is
/// descended into whatever it returns.
pub fn walk_all<P, F>(dir: P, fn_include: F) -> WalkTree<F>
where
    P: AsRef<Path>,
    F: FnMut(&Path) -> bool,
{
    WalkTree::new(dir, EnumWalkMode::All, fn_include)
}

/// Walk only the directories under `dir`.
pub fn walk_directories_only<P: AsRef<Path>>(dir: P) -> WalkTree {
    WalkTree::new(dir, EnumWalkMode::DirectoriesOnly, include_everything as FnInclude)
}

/// Walk only the files under `dir`.
///
/// Every non-link subdirectory is descended into; one that cannot be listed
/// contributes nothing.
pub fn walk_files_only<P: AsRef<Path>>(dir: P) -> WalkTree {
    WalkTree::new(dir, EnumWalkMode::FilesOnly, include_everything as FnInclude)
}

fn list_directory(path_dir: &Path, enum_mode: EnumWalkMode) -> SpecDirListing {
    let mut l_files: Vec<PathBuf> = Vec::new();
    let mut l_dirs: Vec<PathBuf> = Vec::new();

    match fs::read_dir(path_dir) {
        Ok(iter_entries) => {
            for entry_res in iter_entries {
                let entry = match entry_res {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(
                            path = %path_dir.display(),
                            error = %e,
                            "Failed to read directory entry"
                        );
                        continue;
                    }
                };

                let path_entry = entry.path();
                let cfg_file_type = match entry.file_type() {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(path = %path_entry.display(), error = %e, "Failed to inspect entry");
                        continue;
                    }
                };

                let b_is_dir = cfg_file_type.is_dir()
                    || (cfg_file_type.is_symlink() && path_entry.is_dir());
                if b_is_dir {
                    l_dirs.push(path_entry);
                } else if enum_mode != EnumWalkMode::DirectoriesOnly {
                    l_files.push(path_entry);
                }
            }
        }
        Err(e) => {
            warn!(path = %path_dir.display(), error = %e, "Failed to read directory");
        }
    }

    l_files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    l_dirs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    SpecDirListing {
        l_files: l_files.into_iter(),
        l_dirs: l_dirs.into_iter(),
    }
}
