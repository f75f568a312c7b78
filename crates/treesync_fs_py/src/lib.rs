use std::collections::BTreeMap;
use std::path::Path;

use pyo3::exceptions::{PyNotADirectoryError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use treesync_fs::{
    BoxError, CopyPredicate, CopyTree, CopyTreeError, EnumCopyPatternMode, EnumWalkMode,
    ReportCopy, SpecCopyOptions, SpecCopyOutcome, SpecFilterOptions, SpecPathFilter,
    SpecReportError, WalkTree, copy_tree_with,
};
use treesync_log::{EnumLogFormat, LogInitError, SpecLogOptions};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "treesync.fs.copy_tree.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

////////////////////////////////////////////////////////////////////////////////
// #region Models

#[pyclass(name = "CopyOutcome", frozen)]
#[derive(Debug, Clone)]
struct PyCopyOutcome {
    outcome: SpecCopyOutcome,
}

#[pymethods]
impl PyCopyOutcome {
    #[getter]
    fn path_src(&self) -> String {
        self.outcome.path_src.to_string_lossy().to_string()
    }

    #[getter]
    fn path_dst(&self) -> String {
        self.outcome.path_dst.to_string_lossy().to_string()
    }

    #[getter]
    fn if_succeeded(&self) -> bool {
        self.outcome.if_succeeded
    }

    #[getter]
    fn error_kind(&self) -> Option<&'static str> {
        self.outcome.error.as_ref().map(|e| e.kind.as_str())
    }

    #[getter]
    fn error_message(&self) -> Option<String> {
        self.outcome.error.as_ref().map(|e| e.message.clone())
    }

    #[getter]
    fn native_code(&self) -> Option<i32> {
        self.outcome.error.as_ref().and_then(|e| e.native_code)
    }

    fn __bool__(&self) -> bool {
        self.outcome.if_succeeded
    }

    fn __str__(&self) -> String {
        self.outcome.to_string()
    }
}

#[pyclass(name = "SpecCopyError", frozen)]
#[derive(Debug, Clone)]
struct PySpecCopyError {
    #[pyo3(get)]
    path_src: String,
    #[pyo3(get)]
    path_dst: String,
    #[pyo3(get)]
    kind: String,
    #[pyo3(get)]
    message: String,
    #[pyo3(get)]
    native_code: Option<i32>,
}

impl From<SpecReportError> for PySpecCopyError {
    fn from(spec_error: SpecReportError) -> Self {
        Self {
            path_src: spec_error.path_src.to_string_lossy().to_string(),
            path_dst: spec_error.path_dst.to_string_lossy().to_string(),
            kind: spec_error.error.kind.as_str().to_string(),
            message: spec_error.error.message,
            native_code: spec_error.error.native_code,
        }
    }
}

#[pyclass(name = "ReportCopy", frozen)]
#[derive(Debug, Clone)]
struct PyReportCopy {
    report_copy: ReportCopy,
}

impl From<ReportCopy> for PyReportCopy {
    fn from(report_copy: ReportCopy) -> Self {
        Self { report_copy }
    }
}

#[pymethods]
impl PyReportCopy {
    #[getter]
    fn cnt_outcomes(&self) -> u64 {
        self.report_copy.cnt_outcomes
    }

    #[getter]
    fn cnt_succeeded(&self) -> u64 {
        self.report_copy.cnt_succeeded
    }

    #[getter]
    fn cnt_failed(&self) -> u64 {
        self.report_copy.cnt_failed
    }

    #[getter]
    fn errors(&self) -> Vec<PySpecCopyError> {
        self.report_copy
            .errors
            .iter()
            .cloned()
            .map(PySpecCopyError::from)
            .collect()
    }

    #[getter]
    fn error_count(&self) -> usize {
        self.report_copy.error_count()
    }

    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.report_copy.to_dict()
    }

    #[pyo3(signature = (prefix = "[COPY]"))]
    fn format(&self, prefix: &str) -> String {
        self.report_copy.format(prefix)
    }

    fn __str__(&self) -> String {
        self.report_copy.to_string()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Predicate

/// Pattern filter and/or Python callable, evaluated in that order.
struct PyPredicate {
    filter: Option<SpecPathFilter>,
    callback: Option<Py<PyAny>>,
}

impl CopyPredicate for PyPredicate {
    fn should_copy(&mut self, path_src: &Path, path_dst: &Path) -> Result<bool, BoxError> {
        if let Some(filter) = &self.filter {
            if !filter.is_accepted(path_src)? {
                return Ok(false);
            }
        }
        let Some(callback) = &self.callback else {
            return Ok(true);
        };

        Python::with_gil(|py| {
            let c_src = path_src.to_string_lossy();
            let c_dst = path_dst.to_string_lossy();
            callback
                .call1(py, (c_src.as_ref(), c_dst.as_ref()))
                .and_then(|ret| ret.bind(py).is_truthy())
                .map_err(|e| BoxError::from(e.to_string()))
        })
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Parsing

fn parse_rule_pattern(value: &str) -> PyResult<EnumCopyPatternMode> {
    match value {
        "glob" => Ok(EnumCopyPatternMode::Glob),
        "regex" => Ok(EnumCopyPatternMode::Regex),
        "literal" => Ok(EnumCopyPatternMode::Literal),
        _ => Err(PyValueError::new_err(format!(
            "Invalid pattern strategy: `{value}`. Expected one of: ['glob', 'regex', 'literal']"
        ))),
    }
}

fn parse_walk_mode(value: &str) -> PyResult<EnumWalkMode> {
    match value {
        "all" => Ok(EnumWalkMode::All),
        "dirs" => Ok(EnumWalkMode::DirectoriesOnly),
        "files" => Ok(EnumWalkMode::FilesOnly),
        _ => Err(PyValueError::new_err(format!(
            "Invalid walk mode: `{value}`. Expected one of: ['all', 'dirs', 'files']"
        ))),
    }
}

fn map_copy_tree_error(exception: CopyTreeError) -> PyErr {
    match exception {
        CopyTreeError::SourceNotDirectory(path_src) => PyNotADirectoryError::new_err(format!(
            "Source is not a directory: {}",
            path_src.display()
        )),
        CopyTreeError::InvalidArgument(_)
        | CopyTreeError::InvalidPattern(_)
        | CopyTreeError::SourceDestinationOverlap { .. } => {
            PyValueError::new_err(exception.to_string())
        }
    }
}

fn map_log_init_error(exception: LogInitError) -> PyErr {
    match exception {
        LogInitError::AlreadyInitialized => PyRuntimeError::new_err(exception.to_string()),
        LogInitError::InvalidFormat(_) | LogInitError::InvalidLevel { .. } => {
            PyValueError::new_err(exception.to_string())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn build_copy_tree(
    dir_source: String,
    dir_destination: String,
    name_dir_dst: Option<String>,
    if_dry_run: bool,
    predicate: Option<Py<PyAny>>,
    patterns_include_files: Option<Vec<String>>,
    patterns_exclude_files: Option<Vec<String>>,
    patterns_include_dirs: Option<Vec<String>>,
    patterns_exclude_dirs: Option<Vec<String>>,
    rule_pattern: &str,
) -> PyResult<CopyTree<PyPredicate>> {
    let spec_filter_options = SpecFilterOptions {
        patterns_include_files: patterns_include_files.unwrap_or_default(),
        patterns_exclude_files: patterns_exclude_files.unwrap_or_default(),
        patterns_include_dirs: patterns_include_dirs.unwrap_or_default(),
        patterns_exclude_dirs: patterns_exclude_dirs.unwrap_or_default(),
        rule_pattern: parse_rule_pattern(rule_pattern)?,
    };
    let b_has_patterns = !(spec_filter_options.patterns_include_files.is_empty()
        && spec_filter_options.patterns_exclude_files.is_empty()
        && spec_filter_options.patterns_include_dirs.is_empty()
        && spec_filter_options.patterns_exclude_dirs.is_empty());
    let filter = if b_has_patterns {
        let filter = SpecPathFilter::compile(&dir_source, &spec_filter_options)
            .map_err(map_copy_tree_error)?;
        Some(filter)
    } else {
        None
    };

    let spec_cp_options = SpecCopyOptions {
        name_dir_dst,
        if_dry_run,
    };
    let py_predicate = PyPredicate {
        filter,
        callback: predicate,
    };
    copy_tree_with(dir_source, dir_destination, spec_cp_options, py_predicate)
        .map_err(map_copy_tree_error)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Functions

#[pyclass(name = "CopyTreeIterator")]
struct PyCopyTreeIterator {
    copy_tree: CopyTree<PyPredicate>,
}

#[pymethods]
impl PyCopyTreeIterator {
    fn __iter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    fn __next__(&mut self, py: Python<'_>) -> Option<PyCopyOutcome> {
        let copy_tree = &mut self.copy_tree;
        py.allow_threads(|| copy_tree.next())
            .map(|outcome| PyCopyOutcome { outcome })
    }

    #[getter]
    fn path_dir_dst(&self) -> String {
        self.copy_tree.path_dir_dst().to_string_lossy().to_string()
    }

    /// Counters for the outcomes yielded so far.
    fn report(&self) -> PyReportCopy {
        PyReportCopy::from(self.copy_tree.report())
    }
}

#[pyfunction(name = "iter_copy_tree")]
#[pyo3(signature = (
    dir_source,
    dir_destination,
    name_dir_dst = None,
    if_dry_run = false,
    predicate = None,
    patterns_include_files = None,
    patterns_exclude_files = None,
    patterns_include_dirs = None,
    patterns_exclude_dirs = None,
    rule_pattern = "glob"
))]
#[allow(clippy::too_many_arguments)]
fn iter_copy_tree_py(
    dir_source: String,
    dir_destination: String,
    name_dir_dst: Option<String>,
    if_dry_run: bool,
    predicate: Option<Py<PyAny>>,
    patterns_include_files: Option<Vec<String>>,
    patterns_exclude_files: Option<Vec<String>>,
    patterns_include_dirs: Option<Vec<String>>,
    patterns_exclude_dirs: Option<Vec<String>>,
    rule_pattern: &str,
) -> PyResult<PyCopyTreeIterator> {
    let copy_tree = build_copy_tree(
        dir_source,
        dir_destination,
        name_dir_dst,
        if_dry_run,
        predicate,
        patterns_include_files,
        patterns_exclude_files,
        patterns_include_dirs,
        patterns_exclude_dirs,
        rule_pattern,
    )?;
    Ok(PyCopyTreeIterator { copy_tree })
}

#[pyfunction(name = "copy_tree")]
#[pyo3(signature = (
    dir_source,
    dir_destination,
    name_dir_dst = None,
    if_dry_run = false,
    predicate = None,
    patterns_include_files = None,
    patterns_exclude_files = None,
    patterns_include_dirs = None,
    patterns_exclude_dirs = None,
    rule_pattern = "glob"
))]
#[allow(clippy::too_many_arguments)]
fn copy_tree_py(
    py: Python<'_>,
    dir_source: String,
    dir_destination: String,
    name_dir_dst: Option<String>,
    if_dry_run: bool,
    predicate: Option<Py<PyAny>>,
    patterns_include_files: Option<Vec<String>>,
    patterns_exclude_files: Option<Vec<String>>,
    patterns_include_dirs: Option<Vec<String>>,
    patterns_exclude_dirs: Option<Vec<String>>,
    rule_pattern: &str,
) -> PyResult<PyReportCopy> {
    let copy_tree = build_copy_tree(
        dir_source,
        dir_destination,
        name_dir_dst,
        if_dry_run,
        predicate,
        patterns_include_files,
        patterns_exclude_files,
        patterns_include_dirs,
        patterns_exclude_dirs,
        rule_pattern,
    )?;

    let report_copy = py.allow_threads(|| copy_tree.into_report());
    Ok(PyReportCopy::from(report_copy))
}

#[pyfunction(name = "walk_tree")]
#[pyo3(signature = (dir, mode = "all"))]
fn walk_tree_py(py: Python<'_>, dir: String, mode: &str) -> PyResult<Vec<String>> {
    let enum_mode = parse_walk_mode(mode)?;
    let l_paths: Vec<String> = py.allow_threads(|| {
        WalkTree::new(&dir, enum_mode, |_: &Path| true)
            .map(|path| path.to_string_lossy().to_string())
            .collect()
    });
    Ok(l_paths)
}

#[pyfunction(name = "init_logging")]
#[pyo3(signature = (level = "info", format = "text"))]
fn init_logging_py(level: &str, format: &str) -> PyResult<()> {
    let spec_log_options = SpecLogOptions {
        level: level.to_string(),
        format: format
            .parse::<EnumLogFormat>()
            .map_err(map_log_init_error)?,
    };
    treesync_log::init_logging(&spec_log_options).map_err(map_log_init_error)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[pymodule]
fn _treesync_fs_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyCopyOutcome>()?;
    module.add_class::<PySpecCopyError>()?;
    module.add_class::<PyReportCopy>()?;
    module.add_class::<PyCopyTreeIterator>()?;
    module.add_function(wrap_pyfunction!(iter_copy_tree_py, module)?)?;
    module.add_function(wrap_pyfunction!(copy_tree_py, module)?)?;
    module.add_function(wrap_pyfunction!(walk_tree_py, module)?)?;
    module.add_function(wrap_pyfunction!(init_logging_py, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
