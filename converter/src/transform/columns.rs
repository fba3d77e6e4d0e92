//! Redundant column pruning.

use crate::models::Table;

/// SurveyCTO display columns Kobo ignores.
pub const UNUSED_COLUMNS: [&str; 4] = ["style", "readonly", "publishable", "autoplay"];

/// Drop columns that are blank on every row, then the known-unused ones.
pub fn remove_redundant_columns(table: &Table) -> Table {
    let mut out = table.clone();
    out.drop_columns(|column| table.is_column_blank(column));
    out.drop_columns(|column| UNUSED_COLUMNS.contains(&column));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Row;

    #[test]
    fn test_blank_and_unused_columns_dropped() {
        let mut input = Table::with_columns(["type", "name", "media::image", "readonly", "appearance"]);
        input.push_row(Row::from_pairs([("type", "text"), ("name", "a"), ("readonly", "yes")]));
        input.push_row(Row::from_pairs([("type", "note"), ("name", "b"), ("appearance", "nan")]));

        let out = remove_redundant_columns(&input);
        assert_eq!(out.columns(), ["type", "name"]);
        assert_eq!(out.len(), 2);
        assert_eq!(out.rows()[0], Row::from_pairs([("type", "text"), ("name", "a")]));
    }

    #[test]
    fn test_empty_table_loses_all_columns() {
        let input = Table::with_columns(["list_name", "name", "label"]);
        let out = remove_redundant_columns(&input);
        assert!(out.columns().is_empty());
    }

    #[test]
    fn test_idempotent() {
        let mut input = Table::with_columns(["type", "style", "hint", "name"]);
        input.push_row(Row::from_pairs([("type", "text"), ("style", "pages"), ("name", "x")]));
        let once = remove_redundant_columns(&input);
        assert_eq!(remove_redundant_columns(&once), once);
    }
}
