//! Error types for the Formbridge conversion pipeline.
//!
//! This module defines one error enum per layer:
//!
//! - [`WorkbookError`] - Reading and writing sheets (CSV, JSON, directories)
//! - [`HierarchyError`] - Cascading location data that cannot be used
//! - [`PipelineError`] - Top-level conversion errors
//! - [`ValidationError`] - Conformance failures of a converted form
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Stages themselves never fail: unknown types, unsafe expressions and
//! unbalanced groups are repaired in place. Only a missing survey sheet
//! aborts a conversion.

use thiserror::Error;

// =============================================================================
// Workbook Errors
// =============================================================================

/// Errors while reading or writing workbook sheets.
#[derive(Debug, Error)]
pub enum WorkbookError {
    /// Failed to read or write a file.
    #[error("Workbook IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV content.
    #[error("Invalid CSV in sheet '{sheet}': {message}")]
    Csv { sheet: String, message: String },

    /// Bytes could not be decoded.
    #[error("Failed to decode sheet '{sheet}' as {encoding}")]
    Encoding { sheet: String, encoding: String },

    /// Sheet has no header row.
    #[error("Sheet '{0}' has no header row")]
    NoHeaders(String),

    /// JSON workbook error.
    #[error("Workbook JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Hierarchy Errors
// =============================================================================

/// Errors from cascading location data.
#[derive(Debug, Error)]
pub enum HierarchyError {
    /// Failed to read the hierarchy file.
    #[error("Failed to read hierarchy: {0}")]
    Io(#[from] std::io::Error),

    /// Hierarchy file is not valid JSON.
    #[error("Invalid hierarchy JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A level has a blank list name.
    #[error("Hierarchy level {0} has no list name")]
    MissingListName(usize),

    /// An item references a parent that the previous level does not define.
    #[error("Item '{item}' in list '{list}' references unknown parent '{parent}'")]
    UnknownParent {
        list: String,
        item: String,
        parent: String,
    },
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Conformance failures of a converted form.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Row failed its JSON schema.
    #[error("{sheet} row {row}: {errors:?}")]
    Schema {
        sheet: String,
        row: usize,
        errors: Vec<String>,
    },

    /// Type cell outside the Kobo vocabulary.
    #[error("survey row {row}: unsupported type '{value}'")]
    UnsupportedType { row: usize, value: String },

    /// Named row without a canonical label or hint.
    #[error("survey row {row}: '{column}' is blank for field '{name}'")]
    MissingLanguageCell {
        row: usize,
        name: String,
        column: String,
    },

    /// Field name not lowercase/underscore/alphanumeric.
    #[error("survey row {row}: field name '{name}' is not normalized")]
    UnnormalizedName { row: usize, name: String },

    /// Field name used twice.
    #[error("survey row {row}: duplicate field name '{name}'")]
    DuplicateName { row: usize, name: String },

    /// Begin and end markers do not balance.
    #[error("{kind} markers unbalanced: {begins} begin, {ends} end")]
    Unbalanced {
        kind: String,
        begins: usize,
        ends: usize,
    },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level conversion errors.
///
/// This is the error type returned by [`crate::transform::pipeline::run_pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The field-definitions sheet is absent; nothing can be converted.
    #[error("Workbook has no survey sheet")]
    MissingSurvey,

    /// Workbook error.
    #[error("Workbook error: {0}")]
    Workbook(#[from] WorkbookError),

    /// Hierarchy error.
    #[error("Hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Failed to bind or serve.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for workbook operations.
pub type WorkbookResult<T> = Result<T, WorkbookError>;

/// Result type for hierarchy operations.
pub type HierarchyResult<T> = Result<T, HierarchyError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
