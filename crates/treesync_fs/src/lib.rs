//! `treesync_fs`:
//! Lazy, fault-tolerant recursive directory copy engine.
//!
//! Modules, leaf-first:
//! - `path_op`   : textual path join/split/parent/ancestors
//! - `probe`     : read-only path classification
//! - `walk`      : lazy depth-first traversal
//! - `primitive` : single filesystem mutations reported as outcomes
//! - `copy`      : tree copy orchestration as an iterator of outcomes
//! - `spec`      : enums/options/outcomes/errors and the predicate trait
//! - `filter`    : include/exclude pattern predicate
//! - `report`    : outcome aggregation

pub mod copy;
pub mod filter;
pub mod path_op;
pub mod primitive;
pub mod probe;
pub mod report;
pub mod spec;
pub mod walk;

pub use copy::{CopyTree, copy_tree, copy_tree_with};
pub use filter::SpecPathFilter;
pub use report::{ReportCopy, ReportCopyBuilder, SpecReportError};
pub use spec::{
    BoxError, CopyAll, CopyPredicate, CopyTreeError, EnumCopyErrorKind, EnumCopyPatternMode,
    SpecCopyError, SpecCopyOptions, SpecCopyOutcome, SpecFilterOptions, TryPredicate,
};
pub use walk::{EnumWalkMode, WalkTree, walk_all, walk_directories_only, walk_files_only};
