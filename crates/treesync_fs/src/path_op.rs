//! Textual path arithmetic: join, split, parent and ancestor walks.
//!
//! Every function here is pure. Paths are handled as UTF-8 text separated by
//! [`MAIN_SEPARATOR`]; nothing touches the filesystem.

use std::path::MAIN_SEPARATOR;

use crate::spec::CopyTreeError;

/// Folder label used when a filesystem root carries no alphanumeric identifier.
pub const C_ROOT_LABEL_FALLBACK: char = '_';

/// `true` if `path` is a filesystem root (`/`, or a drive root on Windows).
#[cfg(windows)]
pub fn is_root(path: &str) -> bool {
    let raw = path.as_bytes();
    match raw.len() {
        1 => raw[0] == b'\\',
        2 => raw[0].is_ascii_alphabetic() && raw[1] == b':',
        3 => raw[0].is_ascii_alphabetic() && raw[1] == b':' && raw[2] == b'\\',
        _ => false,
    }
}

/// `true` if `path` is a filesystem root (`/`, or a drive root on Windows).
#[cfg(not(windows))]
pub fn is_root(path: &str) -> bool {
    path.len() == 1 && path.starts_with(MAIN_SEPARATOR)
}

/// Join two paths with exactly one separator.
///
/// One trailing separator is dropped from `p1` and one leading separator from
/// `p2`. Drive delimiters (`:`) inside `p2` become spaces so the suffix can
/// never turn into an absolute path. A trailing separator is removed from the
/// result unless the result is a root.
pub fn concat(p1: &str, p2: &str) -> String {
    let p1 = p1.strip_suffix(MAIN_SEPARATOR).unwrap_or(p1);
    let p2 = p2.strip_prefix(MAIN_SEPARATOR).unwrap_or(p2);

    let mut c_joined = String::with_capacity(p1.len() + p2.len() + 1);
    c_joined.push_str(p1);
    c_joined.push(MAIN_SEPARATOR);
    c_joined.extend(p2.chars().map(|c| if c == ':' { ' ' } else { c }));

    if c_joined.ends_with(MAIN_SEPARATOR) && !is_root(&c_joined) {
        c_joined.pop();
    }
    c_joined
}

/// Split `stem` into `root` (without trailing separator) and the part below it.
///
/// `stem` must equal `root` or lie under it on a separator boundary. The
/// suffix never starts with a separator, so `concat(root, suffix) == stem`
/// whenever the suffix is non-empty.
pub fn split(root: &str, stem: &str) -> Result<(String, String), CopyTreeError> {
    let Some(c_rest) = stem.strip_prefix(root) else {
        return Err(CopyTreeError::InvalidArgument(format!(
            "`{stem}` does not start with `{root}`"
        )));
    };
    if c_rest.is_empty() {
        return Ok((root.to_string(), String::new()));
    }

    match root.strip_suffix(MAIN_SEPARATOR) {
        Some(c_root_trimmed) => Ok((c_root_trimmed.to_string(), c_rest.to_string())),
        None => match c_rest.strip_prefix(MAIN_SEPARATOR) {
            Some(c_suffix) => Ok((root.to_string(), c_suffix.to_string())),
            None => Err(CopyTreeError::InvalidArgument(format!(
                "`{stem}` is not below `{root}`"
            ))),
        },
    }
}

/// Path with its final segment removed.
///
/// Without any separator the input is returned with a separator appended. The
/// parent of a top-level entry is the root itself (`/a` -> `/`).
pub fn parent(path: &str) -> String {
    match path.rfind(MAIN_SEPARATOR) {
        None => format!("{path}{MAIN_SEPARATOR}"),
        Some(idx) => {
            let c_with_sep = &path[..idx + MAIN_SEPARATOR.len_utf8()];
            if is_root(c_with_sep) {
                c_with_sep.to_string()
            } else {
                path[..idx].to_string()
            }
        }
    }
}

/// Lazy walk over the ancestors of `path`, nearest first.
///
/// The path itself is not included. The last item is the first segment and
/// keeps its trailing separator (`/` for an absolute path, `a/` for `a/b`).
/// A path without separators has no ancestors.
pub fn ancestors(path: &str) -> Ancestors<'_> {
    Ancestors {
        path,
        n_end: Some(path.len()),
    }
}

/// Iterator returned by [`ancestors`].
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    path: &'a str,
    n_end: Option<usize>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let n_end = self.n_end?;
        let Some(idx) = self.path[..n_end].rfind(MAIN_SEPARATOR) else {
            self.n_end = None;
            return None;
        };

        if self.path[..idx].contains(MAIN_SEPARATOR) {
            self.n_end = Some(idx);
            Some(&self.path[..idx])
        } else {
            self.n_end = None;
            Some(&self.path[..idx + MAIN_SEPARATOR.len_utf8()])
        }
    }
}

/// Single-character label for a filesystem root, usable as a folder name.
///
/// Drive roots map to their upper-cased drive letter (`C:\` -> `C`); roots
/// without an alphanumeric character map to [`C_ROOT_LABEL_FALLBACK`].
pub fn derive_root_label(root: &str) -> char {
    root.chars()
        .find(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or(C_ROOT_LABEL_FALLBACK)
}

/// Last path segment, ignoring one trailing separator.
pub(crate) fn name_of(path: &str) -> &str {
    let path = path.strip_suffix(MAIN_SEPARATOR).unwrap_or(path);
    match path.rfind(MAIN_SEPARATOR) {
        Some(idx) => &path[idx + MAIN_SEPARATOR.len_utf8()..],
        None => path,
    }
}
