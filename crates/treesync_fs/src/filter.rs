//! Name-based include/exclude filter usable as a copy predicate.

use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::copy::resolve_absolute;
use crate::probe;
use crate::spec::{
    BoxError, CopyPredicate, CopyTreeError, EnumCopyPatternMode, SpecFilterOptions,
};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
enum TypeCopyPatternSeq {
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

impl TypeCopyPatternSeq {
    fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Literal(v) => v.iter().any(|p| value.contains(p.as_str())),
            Self::Glob(v) => v.iter().any(|p| p.is_match(value)),
            Self::Regex(v) => v.iter().any(|p| p.is_match(value)),
        }
    }
}

fn compile_patterns(
    patterns: &[String],
    rule_pattern: EnumCopyPatternMode,
) -> Result<Option<TypeCopyPatternSeq>, CopyTreeError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let seq = match rule_pattern {
        EnumCopyPatternMode::Literal => TypeCopyPatternSeq::Literal(patterns.to_vec()),
        EnumCopyPatternMode::Glob => {
            let mut l_glob = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let matcher = Glob::new(pattern)
                    .map_err(|e| {
                        CopyTreeError::InvalidPattern(format!(
                            "Invalid pattern in include/exclude: {e}"
                        ))
                    })?
                    .compile_matcher();
                l_glob.push(matcher);
            }
            TypeCopyPatternSeq::Glob(l_glob)
        }
        EnumCopyPatternMode::Regex => {
            let mut l_regex = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let regex = Regex::new(pattern).map_err(|e| {
                    CopyTreeError::InvalidPattern(format!(
                        "Invalid pattern in include/exclude: {e}"
                    ))
                })?;
                l_regex.push(regex);
            }
            TypeCopyPatternSeq::Regex(l_regex)
        }
    };
    Ok(Some(seq))
}

/// `true` when `value` fails the include list or hits the exclude list.
fn should_exclude_by_patterns(
    value: &str,
    patterns_include: Option<&TypeCopyPatternSeq>,
    patterns_exclude: Option<&TypeCopyPatternSeq>,
) -> bool {
    let b_is_included = patterns_include.is_none_or(|p| p.is_match(value));
    let b_is_excluded = patterns_exclude.is_some_and(|p| p.is_match(value));
    !b_is_included || b_is_excluded
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathFilter

/// Compiled [`SpecFilterOptions`] bound to one source root.
///
/// Entries are classified at evaluation time: real folders are judged by the
/// directory rules alone, everything else (links included) by the directory
/// rules on its parents plus the file rules on its basename.
#[derive(Debug, Clone)]
pub struct SpecPathFilter {
    path_dir_src: PathBuf,
    patterns_include_files: Option<TypeCopyPatternSeq>,
    patterns_exclude_files: Option<TypeCopyPatternSeq>,
    patterns_include_dirs: Option<TypeCopyPatternSeq>,
    patterns_exclude_dirs: Option<TypeCopyPatternSeq>,
}

impl SpecPathFilter {
    /// Compile `spec_filter_options` for entries below `path_dir_src`.
    pub fn compile<P: AsRef<Path>>(
        path_dir_src: P,
        spec_filter_options: &SpecFilterOptions,
    ) -> Result<Self, CopyTreeError> {
        let path_dir_src = resolve_absolute(path_dir_src.as_ref()).map_err(|e| {
            CopyTreeError::InvalidArgument(format!(
                "source path cannot be made absolute: {} ({e})",
                path_dir_src.as_ref().display()
            ))
        })?;
        let rule_pattern = spec_filter_options.rule_pattern;

        Ok(Self {
            path_dir_src,
            patterns_include_files: compile_patterns(
                &spec_filter_options.patterns_include_files,
                rule_pattern,
            )?,
            patterns_exclude_files: compile_patterns(
                &spec_filter_options.patterns_exclude_files,
                rule_pattern,
            )?,
            patterns_include_dirs: compile_patterns(
                &spec_filter_options.patterns_include_dirs,
                rule_pattern,
            )?,
            patterns_exclude_dirs: compile_patterns(
                &spec_filter_options.patterns_exclude_dirs,
                rule_pattern,
            )?,
        })
    }

    /// Evaluate the rules for `path_src`, which must lie below the source root.
    pub fn is_accepted(&self, path_src: &Path) -> Result<bool, BoxError> {
        let path_rel = path_src.strip_prefix(&self.path_dir_src).map_err(|_| {
            format!(
                "Path is outside the filtered root {}: {}",
                self.path_dir_src.display(),
                path_src.display()
            )
        })?;

        let mut l_names: Vec<&str> = Vec::new();
        for component in path_rel.components() {
            let Component::Normal(name) = component else {
                continue;
            };
            let Some(c_name) = name.to_str() else {
                return Err(format!("Path is not valid UTF-8: {}", path_src.display()).into());
            };
            l_names.push(c_name);
        }

        let c_name_file = if probe::is_folder(path_src) {
            None
        } else {
            l_names.pop()
        };

        for c_name_dir in &l_names {
            if should_exclude_by_patterns(
                c_name_dir,
                self.patterns_include_dirs.as_ref(),
                self.patterns_exclude_dirs.as_ref(),
            ) {
                return Ok(false);
            }
        }
        let Some(c_name_file) = c_name_file else {
            return Ok(true);
        };
        Ok(!should_exclude_by_patterns(
            c_name_file,
            self.patterns_include_files.as_ref(),
            self.patterns_exclude_files.as_ref(),
        ))
    }
}

impl CopyPredicate for SpecPathFilter {
    fn should_copy(&mut self, path_src: &Path, _path_dst: &Path) -> Result<bool, BoxError> {
        self.is_accepted(path_src)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
