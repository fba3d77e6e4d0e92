//! Default value cleanup.

use crate::models::{Column, Table};

/// Fragments that make a default value dynamic.
const UNSAFE_DEFAULT_FRAGMENTS: [&str; 2] = ["pulldata(", "${"];

/// Blank `default` cells that pull external data or reference other fields.
///
/// No other validation of default values is performed.
pub fn clean_default_values(survey: &Table) -> Table {
    let mut out = survey.clone();
    for row in out.rows_mut() {
        let unsafe_default = row
            .get(Column::Default)
            .is_some_and(|v| UNSAFE_DEFAULT_FRAGMENTS.iter().any(|f| v.contains(f)));
        if unsafe_default {
            row.clear(Column::Default);
        }
    }
    out
}
