//! Language column normalization.
//!
//! SurveyCTO forms spell language columns many ways (`label`,
//! `label:English`, `label::English (en)`, `label::العربية`, ...). Kobo expects
//! exactly `label::English`, `label::Arabic`, `hint::English` and
//! `hint::Arabic`. This stage merges every known alias into those four and
//! drops the remaining locale-tagged label/hint columns.
//!
//! ```text
//! label | label::Arabic (ar) | hint:English     label::English | label::Arabic | hint::English | hint::Arabic
//! ------+--------------------+-------------  →  ---------------+---------------+---------------+-------------
//! Age   | العمر              | In years         Age            | العمر         | In years      |
//! ```
//!
//! Plain `label` and `hint` columns are merged but kept, since they carry no
//! locale tag.

use crate::models::{Column, Table};

/// Alias columns merged into each canonical column, exact names only.
const ALIASES: [(Column, &[&str]); 4] = [
    (
        Column::LabelEnglish,
        &["label", "label:English", "label::English (en)", "label::English"],
    ),
    (
        Column::LabelArabic,
        &["label:العربية", "label::Arabic (ar)", "label::العربية", "label::Arabic"],
    ),
    (
        Column::HintEnglish,
        &["hint", "hint:English", "hint::English (en)", "hint::English"],
    ),
    (
        Column::HintArabic,
        &["hint:العربية", "hint::Arabic (ar)", "hint::العربية", "hint::Arabic"],
    ),
];

/// Canonical column an alias feeds, if any.
fn canonical_for(column: &str) -> Option<Column> {
    ALIASES
        .iter()
        .find(|(target, aliases)| column != target.as_str() && aliases.contains(&column))
        .map(|(target, _)| *target)
}

/// True for locale-tagged label/hint columns that are not canonical.
fn is_legacy_language_column(column: &str) -> bool {
    let tagged = column.starts_with("label:") || column.starts_with("hint:");
    tagged
        && !Column::CANONICAL_LANGUAGE
            .iter()
            .any(|c| c.as_str() == column)
}

/// Merge language aliases into the four canonical columns.
///
/// Aliases are visited in the table's original column order; the first
/// non-blank alias fills a blank canonical cell and later aliases never
/// overwrite it. Works on both survey and choices sheets.
pub fn normalize_language_columns(table: &Table) -> Table {
    let mut out = table.clone();
    let original_columns = table.columns().to_vec();

    for canonical in Column::CANONICAL_LANGUAGE {
        out.ensure_column(canonical.as_str());
    }

    for row in out.rows_mut() {
        for column in &original_columns {
            let Some(target) = canonical_for(column) else {
                continue;
            };
            if !row.is_blank(target) {
                continue;
            }
            if let Some(value) = row.get(column).map(str::to_string) {
                row.set(target.as_str(), value);
            }
        }
    }

    out.drop_columns(is_legacy_language_column);
    out
}
