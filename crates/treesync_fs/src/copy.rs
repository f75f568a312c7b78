//! Lazy tree copy orchestration.
//!
//! [`copy_tree`] validates its inputs and returns a [`CopyTree`] iterator. No
//! filesystem work happens until the first `next()`: the first item is always
//! the creation of the destination root, then one item per copied entry.
//! Dropping the iterator stops the copy.

use std::any::Any;
use std::ffi::OsStr;
use std::fs;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};

use tracing::{debug, info, warn};

use crate::path_op::{self, concat, derive_root_label, name_of, split};
use crate::primitive::{copy_file, create_directory};
use crate::probe;
use crate::report::{ReportCopy, ReportCopyBuilder};
use crate::spec::{
    CopyAll, CopyPredicate, CopyTreeError, EnumCopyErrorKind, SpecCopyError, SpecCopyOptions,
    SpecCopyOutcome,
};
use crate::walk::{FnInclude, WalkTree, include_everything, walk_all};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumCopyState {
    CreateRoot,
    Walking,
    Done,
}

/// Iterator of per-item outcomes for one tree copy.
pub struct CopyTree<P = CopyAll> {
    c_dir_src: String,
    c_dir_dst: String,
    if_dry_run: bool,
    predicate: P,
    walker: WalkTree,
    enum_state: EnumCopyState,
    builder_cp_report: ReportCopyBuilder,
}

/// Copy the directory tree `dir_source` into a new folder under
/// `dir_destination`, copying every entry.
///
/// See [`copy_tree_with`] for the full contract.
pub fn copy_tree<S, D>(
    dir_source: S,
    dir_destination: D,
    spec_cp_options: SpecCopyOptions,
) -> Result<CopyTree<CopyAll>, CopyTreeError>
where
    S: AsRef<Path>,
    D: AsRef<Path>,
{
    copy_tree_with(dir_source, dir_destination, spec_cp_options, CopyAll)
}

/// Copy the directory tree `dir_source` into a new folder under
/// `dir_destination`, copying only entries accepted by `predicate`.
///
/// The destination folder is named after the source folder, or
/// `spec_cp_options.name_dir_dst` when given; a filesystem root is named by a
/// single character (see [`derive_root_label`]).
///
/// The predicate never prunes the walk: when it rejects a directory, entries
/// below it are still offered and the rejected directory is created on demand
/// as their ancestor.
///
/// `.` and `..` segments of both inputs are folded before the destination is
/// named. A destination root that lies inside the source tree, or contains it,
/// is rejected with [`CopyTreeError::SourceDestinationOverlap`].
///
/// Returns [`CopyTreeError`] only for setup failures. Everything that goes
/// wrong afterwards is reported as a failed [`SpecCopyOutcome`].
pub fn copy_tree_with<S, D, P>(
    dir_source: S,
    dir_destination: D,
    spec_cp_options: SpecCopyOptions,
    predicate: P,
) -> Result<CopyTree<P>, CopyTreeError>
where
    S: AsRef<Path>,
    D: AsRef<Path>,
    P: CopyPredicate,
{
    let c_dir_src = normalize_input(dir_source.as_ref(), "source")?;
    let c_dir_dst_parent = normalize_input(dir_destination.as_ref(), "destination")?;

    if !Path::new(&c_dir_src).is_dir() {
        return Err(CopyTreeError::SourceNotDirectory(PathBuf::from(c_dir_src)));
    }
    if let Some(name_dir_dst) = spec_cp_options.name_dir_dst.as_deref() {
        validate_folder_name(name_dir_dst)?;
    }

    let c_dir_dst = derive_destination_root(
        &c_dir_src,
        &c_dir_dst_parent,
        spec_cp_options.name_dir_dst.as_deref(),
    );
    if is_overlap(Path::new(&c_dir_src), Path::new(&c_dir_dst)) {
        return Err(CopyTreeError::SourceDestinationOverlap {
            path_dir_src: PathBuf::from(c_dir_src),
            path_dir_dst: PathBuf::from(c_dir_dst),
        });
    }
    info!(
        source = %c_dir_src,
        destination = %c_dir_dst,
        dry_run = spec_cp_options.if_dry_run,
        "Tree copy planned"
    );

    let walker = walk_all(Path::new(&c_dir_src), include_everything as FnInclude);
    Ok(CopyTree {
        c_dir_src,
        c_dir_dst,
        if_dry_run: spec_cp_options.if_dry_run,
        predicate,
        walker,
        enum_state: EnumCopyState::CreateRoot,
        builder_cp_report: ReportCopyBuilder::default(),
    })
}

impl<P> CopyTree<P>
where
    P: CopyPredicate,
{
    /// Source root as walked.
    pub fn path_dir_src(&self) -> &Path {
        Path::new(&self.c_dir_src)
    }

    /// Computed destination root (the folder created by the first outcome).
    pub fn path_dir_dst(&self) -> &Path {
        Path::new(&self.c_dir_dst)
    }

    /// Counters for the outcomes emitted so far.
    pub fn report(&self) -> ReportCopy {
        self.builder_cp_report.clone().build()
    }

    /// Drive the copy to completion and return its report.
    pub fn into_report(mut self) -> ReportCopy {
        for _outcome in self.by_ref() {}
        self.builder_cp_report.build()
    }

    fn process_entry(&mut self, path_src: &Path) -> Option<SpecCopyOutcome> {
        let Some(c_src) = path_src.to_str() else {
            return Some(SpecCopyOutcome::failure(
                path_src,
                Path::new(&self.c_dir_dst),
                SpecCopyError::new(
                    EnumCopyErrorKind::InvalidArgument,
                    format!("Path is not valid UTF-8: {}", path_src.display()),
                ),
            ));
        };
        let c_suffix = match split(&self.c_dir_src, c_src) {
            Ok((_, c_suffix)) => c_suffix,
            Err(e) => {
                return Some(SpecCopyOutcome::failure(
                    path_src,
                    Path::new(&self.c_dir_dst),
                    SpecCopyError::new(EnumCopyErrorKind::InvalidArgument, e.to_string()),
                ));
            }
        };
        let c_dst = concat(&self.c_dir_dst, &c_suffix);
        let path_dst = PathBuf::from(&c_dst);

        let predicate = &mut self.predicate;
        let res_predicate = catch_unwind(AssertUnwindSafe(|| {
            predicate.should_copy(path_src, &path_dst)
        }));
        let message = match res_predicate {
            Ok(Ok(true)) => None,
            Ok(Ok(false)) => {
                debug!(path = %path_src.display(), "Rejected by predicate");
                return None;
            }
            Ok(Err(e)) => Some(e.to_string()),
            Err(payload) => Some(format!("Predicate panicked: {}", panic_message(&*payload))),
        };
        if let Some(message) = message {
            return Some(SpecCopyOutcome::failure(
                path_src,
                path_dst,
                SpecCopyError::new(EnumCopyErrorKind::PredicateEvaluation, message),
            ));
        }

        if let Some(error) = self.ensure_ancestors(&c_suffix, &c_dst) {
            return Some(SpecCopyOutcome::failure(path_src, path_dst, error));
        }
        Some(self.copy_leaf(path_src, &path_dst))
    }

    /// Create every missing destination directory between the destination
    /// root and `c_dst`, shallowest first.
    fn ensure_ancestors(&self, c_suffix: &str, c_dst: &str) -> Option<SpecCopyError> {
        if probe::exists(Path::new(&path_op::parent(c_dst))) {
            return None;
        }

        let l_ancestors: Vec<&str> = path_op::ancestors(c_suffix).collect();
        for c_rel in l_ancestors.into_iter().rev() {
            let c_ancestor_dst = concat(&self.c_dir_dst, c_rel);
            if probe::exists(Path::new(&c_ancestor_dst)) {
                continue;
            }
            // Drive-delimiter replacement applies to the destination side only.
            let path_ancestor_src =
                Path::new(&self.c_dir_src).join(c_rel.trim_end_matches(MAIN_SEPARATOR));
            let outcome = create_directory(
                Path::new(&c_ancestor_dst),
                &path_ancestor_src,
                self.if_dry_run,
            );
            if !outcome.if_succeeded {
                return outcome.error;
            }
        }
        None
    }

    fn copy_leaf(&self, path_src: &Path, path_dst: &Path) -> SpecCopyOutcome {
        if probe::is_file(path_src) {
            return copy_file(path_src, path_dst, self.if_dry_run);
        }
        if probe::is_folder(path_src) {
            return create_directory(path_dst, path_src, self.if_dry_run);
        }

        let error = if std::fs::symlink_metadata(path_src).is_err() {
            SpecCopyError::new(
                EnumCopyErrorKind::ConsistencyViolation,
                format!("Entry vanished during traversal: {}", path_src.display()),
            )
        } else {
            SpecCopyError::new(
                EnumCopyErrorKind::UnsupportedEntry,
                format!("Path is neither a file nor a folder: {}", path_src.display()),
            )
        };
        SpecCopyOutcome::failure(path_src, path_dst, error)
    }

    fn record(&mut self, outcome: &SpecCopyOutcome) {
        if outcome.if_succeeded {
            debug!(
                source = %outcome.path_src.display(),
                destination = %outcome.path_dst.display(),
                dry_run = self.if_dry_run,
                "Copied"
            );
        } else if let Some(error) = &outcome.error {
            warn!(
                source = %outcome.path_src.display(),
                destination = %outcome.path_dst.display(),
                kind = %error.kind,
                error = %error.message,
                "Copy failed"
            );
        }
        self.builder_cp_report.add_outcome(outcome);
    }
}

impl<P> Iterator for CopyTree<P>
where
    P: CopyPredicate,
{
    type Item = SpecCopyOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        match self.enum_state {
            EnumCopyState::CreateRoot => {
                self.enum_state = EnumCopyState::Walking;
                let outcome = create_directory(
                    Path::new(&self.c_dir_dst),
                    Path::new(&self.c_dir_src),
                    self.if_dry_run,
                );
                self.record(&outcome);
                Some(outcome)
            }
            EnumCopyState::Walking => loop {
                let Some(path_entry) = self.walker.next() else {
                    self.enum_state = EnumCopyState::Done;
                    info!(
                        destination = %self.c_dir_dst,
                        summary = %self.builder_cp_report.clone().build(),
                        "Tree copy finished"
                    );
                    return None;
                };
                if let Some(outcome) = self.process_entry(&path_entry) {
                    self.record(&outcome);
                    return Some(outcome);
                }
            },
            EnumCopyState::Done => None,
        }
    }
}

/// Destination folder for a copy of `c_dir_src` placed under `c_dir_dst_parent`.
pub(crate) fn derive_destination_root(
    c_dir_src: &str,
    c_dir_dst_parent: &str,
    name_dir_dst: Option<&str>,
) -> String {
    if path_op::is_root(c_dir_src) {
        return concat(c_dir_dst_parent, &derive_root_label(c_dir_src).to_string());
    }
    match name_dir_dst {
        Some(name_dir_dst) => concat(c_dir_dst_parent, name_dir_dst),
        None => concat(c_dir_dst_parent, name_of(c_dir_src)),
    }
}

fn normalize_input(path: &Path, c_role: &str) -> Result<String, CopyTreeError> {
    if path.as_os_str().is_empty() {
        return Err(CopyTreeError::InvalidArgument(format!(
            "{c_role} path is empty"
        )));
    }
    let path_abs = resolve_absolute(path).map_err(|e| {
        CopyTreeError::InvalidArgument(format!(
            "{c_role} path cannot be made absolute: {} ({e})",
            path.display()
        ))
    })?;
    let Some(c_path) = path_abs.to_str() else {
        return Err(CopyTreeError::InvalidArgument(format!(
            "{c_role} path is not valid UTF-8: {}",
            path_abs.display()
        )));
    };

    if path_op::is_root(c_path) {
        return Ok(c_path.to_string());
    }
    let c_trimmed = c_path.trim_end_matches(MAIN_SEPARATOR);
    if c_trimmed.is_empty() || path_op::is_root(&format!("{c_trimmed}{MAIN_SEPARATOR}")) {
        return Ok(format!("{c_trimmed}{MAIN_SEPARATOR}"));
    }
    Ok(c_trimmed.to_string())
}

/// Absolute form of `path` with `.` and `..` folded lexically.
///
/// Links are not resolved, so `a/link/..` becomes `a`.
pub(crate) fn resolve_absolute(path: &Path) -> std::io::Result<PathBuf> {
    let path_abs = std::path::absolute(path)?;
    let mut path_resolved = PathBuf::new();
    for component in path_abs.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                path_resolved.pop();
            }
            _ => path_resolved.push(component.as_os_str()),
        }
    }
    Ok(path_resolved)
}

/// Canonical form of the longest existing prefix of `path`, with the missing
/// tail appended unchanged.
fn resolve_existing_prefix(path: &Path) -> PathBuf {
    let mut l_tail: Vec<&OsStr> = Vec::new();
    let mut path_cursor = path;
    loop {
        if let Ok(path_real) = fs::canonicalize(path_cursor) {
            let mut path_resolved = path_real;
            for name in l_tail.iter().rev() {
                path_resolved.push(name);
            }
            return path_resolved;
        }
        match (path_cursor.parent(), path_cursor.file_name()) {
            (Some(path_parent), Some(name)) => {
                l_tail.push(name);
                path_cursor = path_parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// `true` when either directory lies inside (or is) the other.
fn is_overlap(path_dir_src: &Path, path_dir_dst: &Path) -> bool {
    let path_src_resolved = resolve_existing_prefix(path_dir_src);
    let path_dst_resolved = resolve_existing_prefix(path_dir_dst);
    path_dst_resolved.starts_with(&path_src_resolved)
        || path_src_resolved.starts_with(&path_dst_resolved)
}

fn validate_folder_name(name_dir_dst: &str) -> Result<(), CopyTreeError> {
    let b_is_invalid = name_dir_dst.is_empty()
        || name_dir_dst == "."
        || name_dir_dst == ".."
        || name_dir_dst.contains(MAIN_SEPARATOR)
        || name_dir_dst.contains('/');
    if b_is_invalid {
        return Err(CopyTreeError::InvalidArgument(format!(
            "Destination folder name must be a single path segment: `{name_dir_dst}`"
        )));
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        return (*msg).to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "unknown panic payload".to_string()
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};

    use tempfile::TempDir;

    use super::{copy_tree, copy_tree_with, derive_destination_root};
    use crate::spec::{
        CopyTreeError, EnumCopyErrorKind, SpecCopyOptions, SpecCopyOutcome, TryPredicate,
    };

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, txt).expect("write text");
    }

    fn p(txt: &str) -> String {
        txt.replace('/', MAIN_SEPARATOR_STR)
    }

    #[test]
    fn copy_tree_smoke_basic() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");

        write_text(&src.join("root.txt"), "root");
        write_text(&src.join("a/file1.txt"), "a");
        write_text(&src.join("b/sub/file2.txt"), "b");

        let l_outcomes: Vec<SpecCopyOutcome> =
            copy_tree(&src, &dst, SpecCopyOptions::default())
                .expect("copy tree")
                .collect();
        assert!(l_outcomes.iter().all(|o| o.if_succeeded));
        // root + 3 files + 3 directories
        assert_eq!(l_outcomes.len(), 7);
        assert_eq!(l_outcomes[0].path_dst, dst.join("src"));
        assert!(dst.join("src/root.txt").exists());
        assert!(dst.join("src/a/file1.txt").exists());
        assert!(dst.join("src/b/sub/file2.txt").exists());
    }

    #[test]
    fn copy_tree_is_lazy() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("a.txt"), "a");

        let mut iter_copy = copy_tree(&src, &dst, SpecCopyOptions::default()).expect("copy tree");
        assert!(!dst.exists());

        let outcome_root = iter_copy.next().expect("root outcome");
        assert!(outcome_root.if_succeeded);
        assert!(dst.join("src").is_dir());
        assert!(!dst.join("src/a.txt").exists());
        drop(iter_copy);
        assert!(!dst.join("src/a.txt").exists());
    }

    #[test]
    fn copy_tree_uses_rename_for_destination_folder() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("a.txt"), "a");

        let spec_cp_options = SpecCopyOptions {
            name_dir_dst: Some("backup".to_string()),
            ..SpecCopyOptions::default()
        };
        let report = copy_tree(&src, &dst, spec_cp_options)
            .expect("copy tree")
            .into_report();
        assert_eq!(report.error_count(), 0);
        assert!(dst.join("backup/a.txt").exists());
        assert!(!dst.join("src").exists());
    }

    #[test]
    fn copy_tree_rejected_directory_is_rebuilt_as_ancestor() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("x/deep/leaf.txt"), "leaf");

        let path_rejected = src.join("x");
        let l_outcomes: Vec<SpecCopyOutcome> = copy_tree_with(
            &src,
            &dst,
            SpecCopyOptions::default(),
            |path_src: &Path, _: &Path| path_src != path_rejected.as_path(),
        )
        .expect("copy tree")
        .collect();

        let l_sources: Vec<PathBuf> = l_outcomes.iter().map(|o| o.path_src.clone()).collect();
        assert!(!l_sources.contains(&src.join("x")));
        assert!(l_sources.contains(&src.join("x/deep")));
        assert!(l_sources.contains(&src.join("x/deep/leaf.txt")));
        assert!(l_outcomes.iter().all(|o| o.if_succeeded));
        assert!(dst.join("src/x").is_dir());
        assert!(dst.join("src/x/deep/leaf.txt").exists());
    }

    #[test]
    fn copy_tree_predicate_error_fails_single_item() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("bad.txt"), "bad");
        write_text(&src.join("good.txt"), "good");

        let predicate = TryPredicate(|path_src: &Path, _: &Path| {
            if path_src.ends_with("bad.txt") {
                Err(io::Error::other("cannot decide"))
            } else {
                Ok(true)
            }
        });
        let l_outcomes: Vec<SpecCopyOutcome> =
            copy_tree_with(&src, &dst, SpecCopyOptions::default(), predicate)
                .expect("copy tree")
                .collect();

        assert_eq!(l_outcomes.len(), 3);
        let outcome_bad = &l_outcomes[1];
        assert!(!outcome_bad.if_succeeded);
        let error = outcome_bad.error.as_ref().expect("error detail");
        assert_eq!(error.kind, EnumCopyErrorKind::PredicateEvaluation);
        assert!(error.message.contains("cannot decide"));
        assert!(l_outcomes[2].if_succeeded);
        assert!(!dst.join("src/bad.txt").exists());
        assert!(dst.join("src/good.txt").exists());
    }

    #[test]
    fn copy_tree_predicate_panic_fails_single_item() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("a.txt"), "a");
        write_text(&src.join("b.txt"), "b");

        let report = copy_tree_with(
            &src,
            &dst,
            SpecCopyOptions::default(),
            |path_src: &Path, _: &Path| {
                if path_src.ends_with("a.txt") {
                    panic!("predicate blew up");
                }
                true
            },
        )
        .expect("copy tree")
        .into_report();

        assert_eq!(report.cnt_outcomes, 3);
        assert_eq!(report.error_count(), 1);
        assert!(report.errors[0].error.message.contains("predicate blew up"));
        assert!(dst.join("src/b.txt").exists());
    }

    #[test]
    fn copy_tree_ancestor_failure_becomes_item_outcome() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("x/leaf.txt"), "leaf");
        // A file where the destination root should go blocks every directory below it.
        write_text(&dst.join("src"), "obstruction");

        let path_rejected = src.join("x");
        let l_outcomes: Vec<SpecCopyOutcome> = copy_tree_with(
            &src,
            &dst,
            SpecCopyOptions::default(),
            |path_src: &Path, _: &Path| path_src != path_rejected.as_path(),
        )
        .expect("copy tree")
        .collect();

        assert_eq!(l_outcomes.len(), 2);
        assert!(!l_outcomes[0].if_succeeded);
        let outcome_leaf = &l_outcomes[1];
        assert_eq!(outcome_leaf.path_src, src.join("x/leaf.txt"));
        assert!(!outcome_leaf.if_succeeded);
        assert_eq!(
            outcome_leaf.error.as_ref().map(|e| e.kind),
            Some(EnumCopyErrorKind::Mutation)
        );
    }

    #[test]
    fn copy_tree_dry_run_matches_real_run_without_mutation() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("a.txt"), "a");
        write_text(&src.join("x/y/z.txt"), "z");

        let spec_cp_dry = SpecCopyOptions {
            if_dry_run: true,
            ..SpecCopyOptions::default()
        };
        let l_dry: Vec<bool> = copy_tree(&src, &dst, spec_cp_dry)
            .expect("dry copy")
            .map(|o| o.if_succeeded)
            .collect();
        assert!(!dst.exists());

        let l_real: Vec<bool> = copy_tree(&src, &dst, SpecCopyOptions::default())
            .expect("real copy")
            .map(|o| o.if_succeeded)
            .collect();
        assert_eq!(l_dry, l_real);
    }

    #[test]
    fn copy_tree_source_must_be_directory() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("file.txt");
        write_text(&src, "x");

        let err = copy_tree(&src, tmp.path().join("dst"), SpecCopyOptions::default())
            .err()
            .expect("must fail");
        assert!(matches!(err, CopyTreeError::SourceNotDirectory(_)));
    }

    #[test]
    fn copy_tree_rejects_empty_paths_and_bad_names() {
        let tmp = TempDir::new().expect("tempdir");
        let err = copy_tree("", tmp.path(), SpecCopyOptions::default())
            .err()
            .expect("empty source");
        assert!(matches!(err, CopyTreeError::InvalidArgument(_)));

        let err = copy_tree(tmp.path(), "", SpecCopyOptions::default())
            .err()
            .expect("empty destination");
        assert!(matches!(err, CopyTreeError::InvalidArgument(_)));

        let spec_cp_options = SpecCopyOptions {
            name_dir_dst: Some(p("a/b")),
            ..SpecCopyOptions::default()
        };
        let err = copy_tree(tmp.path(), tmp.path().join("dst"), spec_cp_options)
            .err()
            .expect("nested rename");
        assert!(matches!(err, CopyTreeError::InvalidArgument(_)));
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_reports_directory_link_as_unsupported() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("real/a.txt"), "a");
        symlink(src.join("real"), src.join("alias")).expect("symlink");

        let l_outcomes: Vec<SpecCopyOutcome> =
            copy_tree(&src, &dst, SpecCopyOptions::default())
                .expect("copy tree")
                .collect();
        let outcome_alias = l_outcomes
            .iter()
            .find(|o| o.path_src == src.join("alias"))
            .expect("alias outcome");
        assert!(!outcome_alias.if_succeeded);
        assert_eq!(
            outcome_alias.error.as_ref().map(|e| e.kind),
            Some(EnumCopyErrorKind::UnsupportedEntry)
        );
        assert!(dst.join("src/real/a.txt").exists());
        assert!(!dst.join("src/alias").exists());
    }

    #[cfg(unix)]
    #[test]
    fn derive_destination_root_labels_filesystem_root() {
        assert_eq!(derive_destination_root("/", "/dst", None), "/dst/_");
        assert_eq!(derive_destination_root("/", "/dst", Some("ignored")), "/dst/_");
        assert_eq!(derive_destination_root("/data/src", "/dst", None), "/dst/src");
        assert_eq!(
            derive_destination_root("/data/src", "/dst", Some("copy")),
            "/dst/copy"
        );
    }

    #[test]
    fn copy_tree_resolves_parent_segments_before_naming_destination() {
        let tmp = TempDir::new().expect("tempdir");
        let base = tmp.path().join("base");
        let dst = tmp.path().join("out/dst");
        write_text(&base.join("payload.txt"), "p");
        std::fs::create_dir_all(base.join("inner")).expect("mkdir inner");

        let path_dir_src = base.join("inner").join("..");
        let iter_copy =
            copy_tree(&path_dir_src, &dst, SpecCopyOptions::default()).expect("copy tree");
        assert_eq!(iter_copy.path_dir_src(), base.as_path());
        assert_eq!(iter_copy.path_dir_dst(), dst.join("base").as_path());

        let report = iter_copy.into_report();
        assert_eq!(report.error_count(), 0);
        assert!(dst.join("base/payload.txt").exists());
        assert!(!tmp.path().join("out/payload.txt").exists());
    }

    #[test]
    fn copy_tree_rejects_overlapping_source_and_destination() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        write_text(&src.join("a.txt"), "a");

        // Destination root would be `src/src`, inside the walked tree.
        let err = copy_tree(&src, &src, SpecCopyOptions::default())
            .err()
            .expect("destination inside source");
        assert!(matches!(err, CopyTreeError::SourceDestinationOverlap { .. }));
        assert!(!src.join("src").exists());

        // Destination root would be `src` itself.
        let err = copy_tree(&src, tmp.path(), SpecCopyOptions::default())
            .err()
            .expect("destination equals source");
        assert!(matches!(err, CopyTreeError::SourceDestinationOverlap { .. }));
        assert_eq!(std::fs::read_to_string(src.join("a.txt")).expect("read"), "a");
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_rejects_overlap_through_directory_link() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        write_text(&src.join("a.txt"), "a");
        symlink(&src, tmp.path().join("alias")).expect("symlink");

        let err = copy_tree(tmp.path().join("alias"), &src, SpecCopyOptions::default())
            .err()
            .expect("linked source overlaps");
        assert!(matches!(err, CopyTreeError::SourceDestinationOverlap { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_rebuilds_parent_whose_name_has_drive_delimiter() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("x:y/leaf.txt"), "leaf");

        let path_rejected = src.join("x:y");
        let l_outcomes: Vec<SpecCopyOutcome> = copy_tree_with(
            &src,
            &dst,
            SpecCopyOptions::default(),
            |path_src: &Path, _: &Path| path_src != path_rejected.as_path(),
        )
        .expect("copy tree")
        .collect();

        let outcome_leaf = l_outcomes
            .iter()
            .find(|o| o.path_src == src.join("x:y/leaf.txt"))
            .expect("leaf outcome");
        assert!(outcome_leaf.if_succeeded, "{outcome_leaf}");
        assert_eq!(outcome_leaf.path_dst, dst.join("src/x y/leaf.txt"));
        assert!(dst.join("src/x y").is_dir());
        assert_eq!(
            std::fs::read_to_string(dst.join("src/x y/leaf.txt")).expect("read"),
            "leaf"
        );
    }

    #[test]
    fn copy_tree_overwrites_previous_copy() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("a.txt"), "v1");

        let report = copy_tree(&src, &dst, SpecCopyOptions::default())
            .expect("first copy")
            .into_report();
        assert_eq!(report.error_count(), 0);

        write_text(&src.join("a.txt"), "v2");
        let report = copy_tree(&src, &dst, SpecCopyOptions::default())
            .expect("second copy")
            .into_report();
        assert_eq!(report.error_count(), 0);
        assert_eq!(
            std::fs::read_to_string(dst.join("src/a.txt")).expect("read"),
            "v2"
        );
    }
}
