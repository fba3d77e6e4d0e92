//! # Formbridge - SurveyCTO to Kobo XLSForm conversion
//!
//! Formbridge migrates survey forms authored for SurveyCTO into the stricter
//! XLSForm dialect accepted by KoboToolbox. A form is three sheets
//! (`survey`, `choices`, `settings`); a fixed pipeline of pure stages
//! normalizes and repairs them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Workbook   │────▶│   Sheets    │────▶│  Pipeline   │────▶│  Kobo sheets│
//! │ (CSV/JSON)  │     │  (auto-enc) │     │ (10 stages) │     │ + reports   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use formbridge::{convert_workbook, ConvertOptions, Workbook};
//! use std::path::Path;
//!
//! let workbook = Workbook::read(Path::new("surveycto_form/")).unwrap();
//! let form = convert_workbook(workbook, &ConvertOptions::default()).unwrap();
//! form.into_workbook().write(Path::new("kobo_form/")).unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`text`] - Blankness and machine-name normalization
//! - [`models`] - Tables, rows, known columns, location hierarchy
//! - [`workbook`] - CSV/JSON sheet reading and writing with auto-detection
//! - [`transform`] - The conversion stages and pipeline
//! - [`validation`] - Kobo conformance checks
//! - [`api`] - HTTP API server and log streaming

// Core modules
pub mod error;
pub mod models;
pub mod text;

// Input / output
pub mod workbook;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    HierarchyError, PipelineError, ServerError, ValidationError, WorkbookError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Column, HierarchyItem, HierarchyLevel, LocationHierarchy, Row, SheetKind, Table, TableDelta,
};

// =============================================================================
// Re-exports - Workbook
// =============================================================================

pub use workbook::{
    detect_delimiter, detect_encoding, parse_sheet, parse_sheet_bytes, write_sheet, ParsedSheet,
    Workbook,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    convert_workbook, run_pipeline, ConvertOptions, ConvertedForm, PipelineState, Stage,
    StageReport,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{is_valid, validate, validate_form, validate_survey};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, ConvertRequest, ConvertResponse};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
