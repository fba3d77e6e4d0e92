//! Domain models for the Formbridge conversion pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`Table`] - Ordered rows plus the ordered union of column names
//! - [`Row`] - Named cells; blank cells are never stored
//! - [`Column`] - Columns the pipeline reads or writes by name
//! - [`SheetKind`] - The three XLSForm sheets
//! - [`LocationHierarchy`] - Cascading choice lists seeded into `choices`

pub mod hierarchy;
pub mod table;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use hierarchy::{HierarchyItem, HierarchyLevel, LocationHierarchy};
pub use table::{Row, Table, TableDelta};

// =============================================================================
// Known Columns
// =============================================================================

/// Columns with a fixed meaning in XLSForm sheets.
///
/// Any other column is carried through untouched by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    // survey
    Type,
    Name,
    Calculation,
    Required,
    Relevant,
    Constraint,
    ChoiceFilter,
    Default,
    // survey + choices
    Label,
    Hint,
    LabelEnglish,
    LabelArabic,
    HintEnglish,
    HintArabic,
    // choices
    ListName,
    // settings
    FormTitle,
    FormId,
    DefaultLanguage,
}

impl Column {
    /// Header text of this column.
    pub const fn as_str(self) -> &'static str {
        match self {
            Column::Type => "type",
            Column::Name => "name",
            Column::Calculation => "calculation",
            Column::Required => "required",
            Column::Relevant => "relevant",
            Column::Constraint => "constraint",
            Column::ChoiceFilter => "choice_filter",
            Column::Default => "default",
            Column::Label => "label",
            Column::Hint => "hint",
            Column::LabelEnglish => "label::English",
            Column::LabelArabic => "label::Arabic",
            Column::HintEnglish => "hint::English",
            Column::HintArabic => "hint::Arabic",
            Column::ListName => "list_name",
            Column::FormTitle => "form_title",
            Column::FormId => "form_id",
            Column::DefaultLanguage => "default_language",
        }
    }

    /// The four canonical language columns, in the order they are appended.
    pub const CANONICAL_LANGUAGE: [Column; 4] = [
        Column::LabelEnglish,
        Column::LabelArabic,
        Column::HintEnglish,
        Column::HintArabic,
    ];
}

impl AsRef<str> for Column {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sheets
// =============================================================================

/// The three sheets of an XLSForm workbook, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetKind {
    Survey,
    Choices,
    Settings,
}

impl SheetKind {
    /// All sheets in the order they are written.
    pub const ALL: [SheetKind; 3] = [SheetKind::Survey, SheetKind::Choices, SheetKind::Settings];

    /// Sheet name inside a workbook.
    pub const fn as_str(self) -> &'static str {
        match self {
            SheetKind::Survey => "survey",
            SheetKind::Choices => "choices",
            SheetKind::Settings => "settings",
        }
    }
}

impl fmt::Display for SheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names() {
        assert_eq!(Column::LabelEnglish.as_str(), "label::English");
        assert_eq!(Column::ChoiceFilter.to_string(), "choice_filter");
        assert_eq!(Column::CANONICAL_LANGUAGE[3], Column::HintArabic);
    }

    #[test]
    fn test_sheet_order() {
        let names: Vec<_> = SheetKind::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["survey", "choices", "settings"]);
    }
}
