//! Conformance checks for converted forms.
//!
//! The survey sheet is checked structurally against the rules Kobo enforces
//! on upload. Settings and choice rows are checked against JSON Schema Draft 7
//! documents embedded at compile time from `schemas/`:
//! - `kobo-settings.json`
//! - `kobo-choice.json`
//!
//! Violations are reported, never raised. Row numbers are 1-based data rows
//! (the header is not counted).
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use formbridge::validation::{is_valid_settings_row, validate_settings_row};
//!
//! let row = json!({ "form_title": "Baseline", "form_id": "baseline", "default_language": "English" });
//! assert!(validate_settings_row(&row).is_ok());
//!
//! assert!(!is_valid_settings_row(&json!({ "form_title": "Baseline" })));
//! ```

use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::ValidationError;
use crate::models::{Column, Row, SheetKind, Table};
use crate::text::normalize_token;
use crate::transform::field_types::is_standard_type;
use crate::transform::pipeline::ConvertedForm;
use crate::transform::structure::Marker;

static SETTINGS_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/kobo-settings.json"))
        .expect("Invalid embedded schema")
});

static CHOICE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/kobo-choice.json"))
        .expect("Invalid embedded schema")
});

// =============================================================================
// JSON Schema helpers
// =============================================================================

/// Validate a JSON value against a schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with every error otherwise
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Boolean form of [`validate`].
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

pub fn validate_settings_row(data: &Value) -> Result<(), Vec<String>> {
    validate(&SETTINGS_SCHEMA, data)
}

pub fn is_valid_settings_row(data: &Value) -> bool {
    is_valid(&SETTINGS_SCHEMA, data)
}

pub fn validate_choice_row(data: &Value) -> Result<(), Vec<String>> {
    validate(&CHOICE_SCHEMA, data)
}

pub fn is_valid_choice_row(data: &Value) -> bool {
    is_valid(&CHOICE_SCHEMA, data)
}

/// JSON object of a row's non-blank cells.
pub fn row_to_json(row: &Row) -> Value {
    let object: Map<String, Value> = row
        .cells()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    Value::Object(object)
}

// =============================================================================
// Form checks
// =============================================================================

/// Every conformance violation of a converted form, survey first.
pub fn validate_form(form: &ConvertedForm) -> Vec<ValidationError> {
    let mut violations = validate_survey(&form.survey);
    violations.extend(validate_rows(SheetKind::Choices, &form.choices, validate_choice_row));
    violations.extend(validate_rows(SheetKind::Settings, &form.settings, validate_settings_row));
    if form.settings.is_empty() {
        violations.push(ValidationError::Schema {
            sheet: SheetKind::Settings.to_string(),
            row: 0,
            errors: vec!["settings sheet has no rows".to_string()],
        });
    }
    violations
}

/// Structural checks of the survey sheet.
pub fn validate_survey(survey: &Table) -> Vec<ValidationError> {
    let mut violations = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (i, row) in survey.rows().iter().enumerate() {
        let row_number = i + 1;

        if let Some(value) = row.field_type() {
            if !is_standard_type(value) {
                violations.push(ValidationError::UnsupportedType {
                    row: row_number,
                    value: value.to_string(),
                });
            }
        }

        let Some(name) = row.name() else {
            continue;
        };
        if normalize_token(Some(name)) != name {
            violations.push(ValidationError::UnnormalizedName {
                row: row_number,
                name: name.to_string(),
            });
        }
        if !seen.insert(name) {
            violations.push(ValidationError::DuplicateName {
                row: row_number,
                name: name.to_string(),
            });
        }
        for column in Column::CANONICAL_LANGUAGE {
            if row.is_blank(column) {
                violations.push(ValidationError::MissingLanguageCell {
                    row: row_number,
                    name: name.to_string(),
                    column: column.to_string(),
                });
            }
        }
    }

    violations.extend(check_balance(survey, "group", Marker::BeginGroup, Marker::EndGroup));
    violations.extend(check_balance(survey, "repeat", Marker::BeginRepeat, Marker::EndRepeat));
    violations
}

fn check_balance(survey: &Table, kind: &str, begin: Marker, end: Marker) -> Option<ValidationError> {
    let count = |marker: Marker| {
        survey
            .rows()
            .iter()
            .filter(|r| Marker::of(r) == Some(marker))
            .count()
    };
    let (begins, ends) = (count(begin), count(end));
    (begins != ends).then(|| ValidationError::Unbalanced {
        kind: kind.to_string(),
        begins,
        ends,
    })
}

fn validate_rows(
    sheet: SheetKind,
    table: &Table,
    check: fn(&Value) -> Result<(), Vec<String>>,
) -> Vec<ValidationError> {
    table
        .rows()
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            check(&row_to_json(row)).err().map(|errors| ValidationError::Schema {
                sheet: sheet.to_string(),
                row: i + 1,
                errors,
            })
        })
        .collect()
}
