//! Python bindings for the nestconf parser.
//!
//! Parsed configurations are returned as plain Python values: blocks become
//! `dict`s (in directive order), repeated directives become `list`s and
//! values become `str` (or `list[str]` with token lists enabled).

use nestconf_core::{
    error::{ParseError as CoreParseError, ParseErrorKind as CoreParseErrorKind},
    span::Span as CoreSpan,
    ConfigEntry, ConfigNode, ConfigValue, ParseResult as CoreParseResult, Parser as CoreParser,
    DEFAULT_MAX_DEPTH,
};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use pyo3::IntoPyObjectExt;

// ============================================================================
// Span
// ============================================================================

/// Source location in the input text (byte offsets).
#[pyclass(frozen, get_all, name = "Span")]
#[derive(Clone)]
pub struct PySpan {
    pub start: u32,
    pub end: u32,
}

#[pymethods]
impl PySpan {
    fn __repr__(&self) -> String {
        format!("Span({}, {})", self.start, self.end)
    }

    #[getter]
    fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }
}

impl From<CoreSpan> for PySpan {
    fn from(s: CoreSpan) -> Self {
        PySpan {
            start: s.start,
            end: s.end,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Parse error category.
#[pyclass(frozen, eq, eq_int, name = "ParseErrorKind")]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PyParseErrorKind {
    UnterminatedString,
    EmptyDirectiveName,
    UnbalancedBraces,
    DepthExceeded,
}

impl From<CoreParseErrorKind> for PyParseErrorKind {
    fn from(k: CoreParseErrorKind) -> Self {
        match k {
            CoreParseErrorKind::UnterminatedString => PyParseErrorKind::UnterminatedString,
            CoreParseErrorKind::EmptyDirectiveName => PyParseErrorKind::EmptyDirectiveName,
            CoreParseErrorKind::UnbalancedBraces => PyParseErrorKind::UnbalancedBraces,
            CoreParseErrorKind::DepthExceeded => PyParseErrorKind::DepthExceeded,
        }
    }
}

/// A parse error.
#[pyclass(frozen, get_all, name = "ParseError")]
#[derive(Clone)]
pub struct PyParseError {
    pub message: String,
    pub span: PySpan,
    pub kind: PyParseErrorKind,
    pub recoverable: bool,
}

#[pymethods]
impl PyParseError {
    fn __repr__(&self) -> String {
        format!("ParseError({:?}, {:?})", self.message, self.kind)
    }

    fn __str__(&self) -> String {
        format!(
            "{} at bytes {}..{}",
            self.message, self.span.start, self.span.end
        )
    }
}

impl From<CoreParseError> for PyParseError {
    fn from(e: CoreParseError) -> Self {
        PyParseError {
            message: e.message,
            span: e.span.into(),
            kind: e.kind.into(),
            recoverable: e.recoverable,
        }
    }
}

// ============================================================================
// Tree conversion
// ============================================================================

fn convert_node(py: Python<'_>, node: &ConfigNode) -> PyResult<PyObject> {
    let dict = PyDict::new(py);
    for (name, entry) in node.iter() {
        dict.set_item(name, convert_entry(py, entry)?)?;
    }
    Ok(dict.into_any().unbind())
}

fn convert_entry(py: Python<'_>, entry: &ConfigEntry) -> PyResult<PyObject> {
    match entry {
        ConfigEntry::Single(value) => convert_value(py, value),
        ConfigEntry::Many(values) => {
            let list = PyList::empty(py);
            for value in values {
                list.append(convert_value(py, value)?)?;
            }
            Ok(list.into_any().unbind())
        }
    }
}

fn convert_value(py: Python<'_>, value: &ConfigValue) -> PyResult<PyObject> {
    match value {
        ConfigValue::Str(s) => (&**s).into_py_any(py),
        ConfigValue::List(items) => {
            let list = PyList::new(py, items.iter().map(|s| &**s))?;
            Ok(list.into_any().unbind())
        }
        ConfigValue::Block(node) => convert_node(py, node),
    }
}

// ============================================================================
// ParseResult
// ============================================================================

/// Result of parsing with error recovery.
#[pyclass(frozen, name = "ParseResult")]
pub struct PyParseResult {
    #[pyo3(get)]
    pub config: PyObject,
    #[pyo3(get)]
    pub errors: Vec<PyParseError>,
}

#[pymethods]
impl PyParseResult {
    #[getter]
    fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn __repr__(&self, py: Python<'_>) -> PyResult<String> {
        let config = self.config.bind(py).downcast::<PyDict>()?;
        Ok(format!(
            "ParseResult(ok={}, directives={}, errors={})",
            self.errors.is_empty(),
            config.len(),
            self.errors.len()
        ))
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Configuration parser.
///
/// Args:
///     max_depth: Maximum block nesting (default 256, None for no limit)
///     token_lists: Keep multi-token values as lists instead of joining them
#[pyclass(name = "Parser")]
pub struct PyParser {
    max_depth: Option<usize>,
    token_lists: bool,
}

impl PyParser {
    fn core(&self, recover: bool) -> CoreParser {
        CoreParser::new()
            .with_recovery(recover)
            .with_max_depth(self.max_depth)
            .with_token_lists(self.token_lists)
    }
}

#[pymethods]
impl PyParser {
    #[new]
    #[pyo3(
        signature = (max_depth=Some(DEFAULT_MAX_DEPTH), token_lists=false),
        text_signature = "(max_depth=256, token_lists=False)"
    )]
    fn new(max_depth: Option<usize>, token_lists: bool) -> Self {
        PyParser {
            max_depth,
            token_lists,
        }
    }

    /// Parse a config string. Raises ValueError on the first error.
    #[pyo3(text_signature = "(self, input)")]
    fn parse(&self, py: Python<'_>, input: &str) -> PyResult<PyObject> {
        match self.core(false).parse(input) {
            Ok(config) => convert_node(py, &config),
            Err(e) => Err(pyo3::exceptions::PyValueError::new_err(e.to_string())),
        }
    }

    /// Parse with error recovery. Always returns a result.
    #[pyo3(text_signature = "(self, input)")]
    fn parse_with_recovery(&self, py: Python<'_>, input: &str) -> PyResult<PyParseResult> {
        let CoreParseResult { config, errors } = self.core(true).parse_with_recovery(input);
        Ok(PyParseResult {
            config: convert_node(py, &config)?,
            errors: errors.into_iter().map(PyParseError::from).collect(),
        })
    }

    fn __repr__(&self) -> String {
        format!(
            "Parser(max_depth={:?}, token_lists={})",
            self.max_depth, self.token_lists
        )
    }
}

// ============================================================================
// Module functions
// ============================================================================

/// Parse a config string.
///
/// Args:
///     input: Configuration text
///     max_depth: Maximum block nesting (default 256, None for no limit)
///     token_lists: Keep multi-token values as lists
///
/// Returns:
///     dict: Parsed configuration
///
/// Raises:
///     ValueError: On parse error
#[pyfunction]
#[pyo3(
    signature = (input, max_depth=Some(DEFAULT_MAX_DEPTH), token_lists=false),
    text_signature = "(input, max_depth=256, token_lists=False)"
)]
fn parse(
    py: Python<'_>,
    input: &str,
    max_depth: Option<usize>,
    token_lists: bool,
) -> PyResult<PyObject> {
    PyParser::new(max_depth, token_lists).parse(py, input)
}

/// Parse with error recovery. Always returns a result.
///
/// Args:
///     input: Configuration text
///     max_depth: Maximum block nesting (default 256, None for no limit)
///     token_lists: Keep multi-token values as lists
///
/// Returns:
///     ParseResult: Result with config dict and errors
#[pyfunction]
#[pyo3(
    signature = (input, max_depth=Some(DEFAULT_MAX_DEPTH), token_lists=false),
    text_signature = "(input, max_depth=256, token_lists=False)"
)]
fn parse_with_recovery(
    py: Python<'_>,
    input: &str,
    max_depth: Option<usize>,
    token_lists: bool,
) -> PyResult<PyParseResult> {
    PyParser::new(max_depth, token_lists).parse_with_recovery(py, input)
}

// ============================================================================
// Module
// ============================================================================

/// nestconf - nginx-style configuration parser.
#[pymodule]
fn pync(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySpan>()?;
    m.add_class::<PyParser>()?;
    m.add_class::<PyParseResult>()?;
    m.add_class::<PyParseErrorKind>()?;
    m.add_class::<PyParseError>()?;
    m.add("DEFAULT_MAX_DEPTH", DEFAULT_MAX_DEPTH)?;
    m.add_function(wrap_pyfunction!(parse, m)?)?;
    m.add_function(wrap_pyfunction!(parse_with_recovery, m)?)?;
    Ok(())
}
