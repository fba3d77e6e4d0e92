//! Cascading select lists.
//!
//! The lists owned by the location hierarchy are reset: any existing rows
//! under those list names are removed and the hierarchy's rows are appended.
//! Every other list is preserved in order. List names match exactly, so
//! `" governorate "` is a separate user list.

use crate::models::{Column, LocationHierarchy, Table};

/// Replace the hierarchy's lists in `choices` with the hierarchy rows.
///
/// When there is no choices sheet, or it has no rows, the result is the
/// hierarchy alone.
pub fn fix_cascading_selects(choices: Option<&Table>, hierarchy: &LocationHierarchy) -> Table {
    let seed = hierarchy.to_table();
    let Some(choices) = choices.filter(|c| !c.is_empty()) else {
        return seed;
    };

    let reserved = hierarchy.list_names();
    let mut out = choices.clone();
    out.retain_rows(|row| {
        row.get(Column::ListName)
            .map_or(true, |list| !reserved.contains(&list))
    });

    for column in seed.columns() {
        out.ensure_column(column.as_str());
    }
    for row in seed.rows() {
        out.push_row(row.clone());
    }
    out
}
