//! Settings sheet repair.

use crate::models::{Column, Row, Table};
use crate::text::normalize_token;

/// Language forced onto every settings row unless configured otherwise.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Guarantee `form_title`, `form_id` and `default_language`.
///
/// A missing or blank title/id (judged on the first row) is derived from the
/// form name: the title verbatim, the id normalized. The default language is
/// always overwritten.
pub fn fix_settings_sheet(
    settings: Option<&Table>,
    form_name: &str,
    default_language: &str,
) -> Table {
    let form_id = normalize_token(Some(form_name));

    let Some(settings) = settings.filter(|s| !s.is_empty()) else {
        let mut out = Table::with_columns([
            Column::FormTitle.as_str(),
            Column::FormId.as_str(),
            Column::DefaultLanguage.as_str(),
        ]);
        out.push_row(Row::from_pairs([
            (Column::FormTitle.as_str(), form_name),
            (Column::FormId.as_str(), form_id.as_str()),
            (Column::DefaultLanguage.as_str(), default_language),
        ]));
        return out;
    };

    let mut out = settings.clone();
    fill_if_blank(&mut out, Column::FormTitle, form_name);
    fill_if_blank(&mut out, Column::FormId, &form_id);

    out.ensure_column(Column::DefaultLanguage.as_str());
    for row in out.rows_mut() {
        row.set(Column::DefaultLanguage.as_str(), default_language);
    }
    out
}

/// Set `column` on every row when the first row has no value for it.
fn fill_if_blank(table: &mut Table, column: Column, value: &str) {
    let first_blank = table.rows().first().map_or(true, |row| row.is_blank(column));
    if !first_blank {
        return;
    }
    table.ensure_column(column.as_str());
    for row in table.rows_mut() {
        row.set(column.as_str(), value);
    }
}
