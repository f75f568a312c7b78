//! Copy specification models, per-item outcomes and top-level error types.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Boxed error returned by fallible copy predicates.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Failure taxonomy carried by a failed [`SpecCopyOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopyErrorKind {
    /// Directory listing failed. Only logged by the walker, never emitted.
    EnumerationAccess,
    /// Caller-supplied predicate returned an error or panicked.
    PredicateEvaluation,
    /// Create/copy/delete/metadata call failed.
    Mutation,
    /// Entry classified during traversal vanished before it was copied.
    ConsistencyViolation,
    /// Entry is neither a regular file nor a real folder at copy time.
    UnsupportedEntry,
    /// Path text could not be handled (empty, not UTF-8, outside the source).
    InvalidArgument,
}

impl EnumCopyErrorKind {
    /// Stable lowercase name, used by logs and the Python bridge.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnumerationAccess => "enumeration_access",
            Self::PredicateEvaluation => "predicate_evaluation",
            Self::Mutation => "mutation",
            Self::ConsistencyViolation => "consistency_violation",
            Self::UnsupportedEntry => "unsupported_entry",
            Self::InvalidArgument => "invalid_argument",
        }
    }
}

impl fmt::Display for EnumCopyErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pattern interpretation used by [`crate::filter::SpecPathFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumCopyPatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    #[default]
    Glob,
    /// Regular expression pattern.
    Regex,
    /// Substring match.
    Literal,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Name-based include/exclude rules for [`crate::filter::SpecPathFilter`].
///
/// File rules are matched against the basename of files only. Directory rules
/// are matched against every directory name between the source root and the
/// entry (the entry itself included when it is a directory). Empty lists
/// impose no constraint.
#[derive(Debug, Clone, Default)]
pub struct SpecFilterOptions {
    /// Include patterns applied to file basename.
    pub patterns_include_files: Vec<String>,
    /// Exclude patterns applied to file basename.
    pub patterns_exclude_files: Vec<String>,
    /// Include patterns applied to directory names.
    pub patterns_include_dirs: Vec<String>,
    /// Exclude patterns applied to directory names.
    pub patterns_exclude_dirs: Vec<String>,
    /// Pattern interpretation mode.
    pub rule_pattern: EnumCopyPatternMode,
}

/// Input options for [`crate::copy_tree`].
///
/// Source and destination roots are passed to `copy_tree` directly; this struct
/// only carries the knobs that shape the run.
#[derive(Debug, Clone, Default)]
pub struct SpecCopyOptions {
    /// Name of the top-level folder created under the destination root.
    /// `None` reuses the source folder name.
    pub name_dir_dst: Option<String>,
    /// Do not mutate filesystem; report what would happen.
    pub if_dry_run: bool,
}

/// Failure detail attached to a failed outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCopyError {
    /// Failure category.
    pub kind: EnumCopyErrorKind,
    /// User-facing error text.
    pub message: String,
    /// Raw OS error number, when the failure came from the OS.
    pub native_code: Option<i32>,
}

impl SpecCopyError {
    pub fn new(kind: EnumCopyErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            native_code: None,
        }
    }

    /// Wrap an `io::Error` as a failed mutation.
    ///
    /// The message is stored without the `(os error N)` suffix; `Display`
    /// appends it from `native_code`.
    pub fn from_io(error: &io::Error) -> Self {
        let native_code = error.raw_os_error();
        let mut message = error.to_string();
        if let Some(code) = native_code {
            let c_suffix = format!(" (os error {code})");
            if let Some(c_bare) = message.strip_suffix(&c_suffix) {
                message = c_bare.to_string();
            }
        }
        Self {
            kind: EnumCopyErrorKind::Mutation,
            message,
            native_code,
        }
    }
}

impl From<io::Error> for SpecCopyError {
    fn from(error: io::Error) -> Self {
        Self::from_io(&error)
    }
}

impl fmt::Display for SpecCopyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.native_code {
            Some(code) => write!(f, "[{}] {} (os error {code})", self.kind, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

/// Result of one attempted mutation, or of one failed predicate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCopyOutcome {
    pub path_src: PathBuf,
    pub path_dst: PathBuf,
    pub if_succeeded: bool,
    pub error: Option<SpecCopyError>,
}

impl SpecCopyOutcome {
    pub fn success(path_src: impl Into<PathBuf>, path_dst: impl Into<PathBuf>) -> Self {
        Self {
            path_src: path_src.into(),
            path_dst: path_dst.into(),
            if_succeeded: true,
            error: None,
        }
    }

    pub fn failure(
        path_src: impl Into<PathBuf>,
        path_dst: impl Into<PathBuf>,
        error: SpecCopyError,
    ) -> Self {
        Self {
            path_src: path_src.into(),
            path_dst: path_dst.into(),
            if_succeeded: false,
            error: Some(error),
        }
    }
}

impl fmt::Display for SpecCopyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c_status = if self.if_succeeded { "Success" } else { "Failure" };
        write!(
            f,
            "{c_status}: {} -> {}",
            self.path_src.display(),
            self.path_dst.display()
        )?;
        if let Some(error) = &self.error {
            write!(f, " {error}")?;
        }
        Ok(())
    }
}

/// "Top-level call failed" errors (input validation / setup stage).
#[derive(Debug, Error)]
pub enum CopyTreeError {
    /// Empty, non-UTF-8 or otherwise unusable path or name.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Invalid include/exclude pattern.
    #[error("{0}")]
    InvalidPattern(String),
    /// Source path is not a directory.
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    /// Destination root and source tree contain one another.
    #[error(
        "Source and destination directories overlap: {} <-> {}",
        path_dir_src.display(),
        path_dir_dst.display()
    )]
    SourceDestinationOverlap {
        /// Normalized source directory.
        path_dir_src: PathBuf,
        /// Computed destination root.
        path_dir_dst: PathBuf,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Predicate

/// Per-entry inclusion test evaluated before an entry is copied.
///
/// `path_dst` is the destination the entry would be copied to. Returning an
/// error (or panicking) produces a failed outcome for that entry only.
pub trait CopyPredicate {
    fn should_copy(&mut self, path_src: &Path, path_dst: &Path) -> Result<bool, BoxError>;
}

impl<F> CopyPredicate for F
where
    F: FnMut(&Path, &Path) -> bool,
{
    fn should_copy(&mut self, path_src: &Path, path_dst: &Path) -> Result<bool, BoxError> {
        Ok(self(path_src, path_dst))
    }
}

/// Adapter for closures that can fail.
pub struct TryPredicate<F>(pub F);

impl<F, E> CopyPredicate for TryPredicate<F>
where
    F: FnMut(&Path, &Path) -> Result<bool, E>,
    E: Into<BoxError>,
{
    fn should_copy(&mut self, path_src: &Path, path_dst: &Path) -> Result<bool, BoxError> {
        (self.0)(path_src, path_dst).map_err(Into::into)
    }
}

/// Default predicate: copy everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyAll;

impl CopyPredicate for CopyAll {
    fn should_copy(&mut self, _path_src: &Path, _path_dst: &Path) -> Result<bool, BoxError> {
        Ok(true)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::Path;

    use super::{
        CopyPredicate, EnumCopyErrorKind, SpecCopyError, SpecCopyOutcome, TryPredicate,
    };

    #[test]
    fn spec_copy_error_keeps_raw_os_code() {
        let error = SpecCopyError::from(io::Error::from_raw_os_error(2));
        assert_eq!(error.kind, EnumCopyErrorKind::Mutation);
        assert_eq!(error.native_code, Some(2));
        assert!(!error.message.contains("os error"));

        let txt = error.to_string();
        assert!(txt.starts_with("[mutation]"));
        assert_eq!(txt.matches("(os error 2)").count(), 1);
    }

    #[test]
    fn outcome_display_marks_failure() {
        let outcome = SpecCopyOutcome::failure(
            "/src/a",
            "/dst/a",
            SpecCopyError::new(EnumCopyErrorKind::UnsupportedEntry, "gone"),
        );
        let txt = outcome.to_string();
        assert!(txt.starts_with("Failure: /src/a -> /dst/a"));
        assert!(txt.contains("[unsupported_entry] gone"));
    }

    #[test]
    fn closures_and_try_predicates_share_the_trait() {
        let mut pred_plain = |_: &Path, path_dst: &Path| path_dst.ends_with("keep");
        assert!(pred_plain
            .should_copy(Path::new("/a"), Path::new("/b/keep"))
            .expect("plain predicate"));

        let mut pred_try = TryPredicate(|path_src: &Path, _: &Path| {
            if path_src.ends_with("bad") {
                Err("rejected by test")
            } else {
                Ok(true)
            }
        });
        assert!(pred_try.should_copy(Path::new("/bad"), Path::new("/x")).is_err());
        assert!(pred_try
            .should_copy(Path::new("/good"), Path::new("/x"))
            .expect("try predicate"));
    }
}
