//! Placeholder labels and hints.
//!
//! Kobo rejects named fields without a label in every declared language.
//! Blank canonical cells on named rows get a fixed template embedding the
//! field name. These are placeholders for a translator to replace, not
//! translations.

use crate::models::{Column, Table};

/// Template for a canonical column, embedding the field name.
fn fallback_text(column: Column, name: &str) -> Option<String> {
    match column {
        Column::LabelEnglish => Some(format!("Input for {}", name)),
        Column::LabelArabic => Some(format!("إدخال لـ {}", name)),
        Column::HintEnglish => Some(format!("Hint for {}", name)),
        Column::HintArabic => Some(format!("تلميح لـ {}", name)),
        _ => None,
    }
}

/// Fill blank canonical label/hint cells on every row that has a name.
///
/// Rows without a name are left untouched. Only columns already present on
/// the table are filled, so run [`super::language::normalize_language_columns`]
/// first.
pub fn apply_fallbacks(survey: &Table) -> Table {
    let mut out = survey.clone();
    if !out.has_column(Column::Name) {
        return out;
    }
    let present: Vec<Column> = Column::CANONICAL_LANGUAGE
        .into_iter()
        .filter(|c| survey.has_column(c))
        .collect();

    for row in out.rows_mut() {
        let Some(name) = row.name().map(str::to_string) else {
            continue;
        };
        for column in &present {
            if !row.is_blank(column) {
                continue;
            }
            if let Some(text) = fallback_text(*column, &name) {
                row.set(column.as_str(), text);
            }
        }
    }
    out
}
