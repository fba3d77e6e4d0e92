//! Table model shared by the survey, choices and settings sheets.
//!
//! A [`Table`] keeps rows in order together with the ordered union of column
//! names. A [`Row`] only stores non-blank cells, so every blank
//! representation (missing key, empty string, `nan`) collapses into one state
//! at construction time and stages never have to distinguish them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use crate::text::is_blank;

/// One sheet row: column name to non-blank value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Row {
    cells: BTreeMap<String, String>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(column, value)` pairs, dropping blank values.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut row = Self::new();
        for (k, v) in pairs {
            row.set(k.into(), v);
        }
        row
    }

    /// Value of a column, `None` when blank.
    pub fn get(&self, column: impl AsRef<str>) -> Option<&str> {
        self.cells.get(column.as_ref()).map(String::as_str)
    }

    /// True when the column holds no value on this row.
    pub fn is_blank(&self, column: impl AsRef<str>) -> bool {
        self.get(column).is_none()
    }

    /// Set a cell. Blank values clear it.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        if is_blank(Some(&value)) {
            self.cells.remove(&column);
        } else {
            self.cells.insert(column, value);
        }
    }

    /// Blank a cell.
    pub fn clear(&mut self, column: impl AsRef<str>) {
        self.cells.remove(column.as_ref());
    }

    /// Non-blank cells in column-name order.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True when every cell is blank.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The `type` cell, trimmed.
    pub fn field_type(&self) -> Option<&str> {
        self.get("type").map(str::trim)
    }

    /// The `name` cell.
    pub fn name(&self) -> Option<&str> {
        self.get("name")
    }

    fn retain_columns(&mut self, keep: impl Fn(&str) -> bool) {
        self.cells.retain(|k, _| keep(k.as_str()));
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        Ok(Row::from_pairs(raw.into_iter().map(|(k, v)| {
            let text = match v {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (k, text)
        })))
    }
}

/// An ordered sheet.
///
/// Invariants: column names are unique, and every non-blank cell of every
/// row belongs to a listed column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTable")]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

/// Deserialization shape; rows may mention columns the header omits.
#[derive(Deserialize)]
struct RawTable {
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Row>,
}

impl From<RawTable> for Table {
    fn from(raw: RawTable) -> Self {
        let mut table = Table::with_columns(raw.columns);
        for row in raw.rows {
            table.push_row(row);
        }
        table
    }
}

impl Table {
    /// Empty table with the given header. Duplicate names are ignored.
    pub fn with_columns<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        let mut table = Self::default();
        for column in columns {
            table.ensure_column(column);
        }
        table
    }

    /// Build a table from a header and positional records.
    ///
    /// Short records are padded with blanks; extra fields are ignored.
    pub fn from_records(headers: &[String], records: &[Vec<String>]) -> Self {
        let mut table = Self::with_columns(headers.iter().cloned());
        for record in records {
            let row = Row::from_pairs(
                headers
                    .iter()
                    .zip(record.iter())
                    .map(|(h, v)| (h.clone(), v.clone())),
            );
            table.rows.push(row);
        }
        table
    }

    /// Positional records in column order, blanks as empty strings.
    pub fn to_records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| row.get(c).unwrap_or_default().to_string())
                    .collect()
            })
            .collect()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: impl AsRef<str>) -> bool {
        self.columns.iter().any(|c| c == column.as_ref())
    }

    /// Append a column if it is not there yet.
    pub fn ensure_column(&mut self, column: impl Into<String>) {
        let column = column.into();
        if !self.has_column(&column) {
            self.columns.push(column);
        }
    }

    /// Append a row, extending the header with any column it introduces.
    pub fn push_row(&mut self, row: Row) {
        let unknown: Vec<String> = row
            .cells()
            .filter(|(k, _)| !self.has_column(k))
            .map(|(k, _)| k.to_string())
            .collect();
        for column in unknown {
            self.columns.push(column);
        }
        self.rows.push(row);
    }

    /// Keep only rows matching the predicate, preserving order.
    pub fn retain_rows(&mut self, keep: impl Fn(&Row) -> bool) {
        self.rows.retain(|r| keep(r));
    }

    /// True when no row has a value in the column.
    pub fn is_column_blank(&self, column: impl AsRef<str>) -> bool {
        self.rows.iter().all(|r| r.is_blank(column.as_ref()))
    }

    /// Remove every column the predicate selects, along with its cells.
    pub fn drop_columns(&mut self, should_drop: impl Fn(&str) -> bool) {
        let dropped: HashSet<String> = self
            .columns
            .iter()
            .filter(|c| should_drop(c.as_str()))
            .cloned()
            .collect();
        if dropped.is_empty() {
            return;
        }
        self.columns.retain(|c| !dropped.contains(c));
        for row in &mut self.rows {
            row.retain_columns(|k| !dropped.contains(k));
        }
    }

    /// Summarize what changed between `self` and a later snapshot.
    pub fn delta(&self, after: &Table) -> TableDelta {
        let columns_added = after
            .columns
            .iter()
            .filter(|c| !self.has_column(c))
            .cloned()
            .collect();
        let columns_removed = self
            .columns
            .iter()
            .filter(|c| !after.has_column(c))
            .cloned()
            .collect();

        let shared: Vec<&String> = self.columns.iter().filter(|c| after.has_column(c)).collect();
        let cells_changed = self
            .rows
            .iter()
            .zip(after.rows.iter())
            .map(|(before, now)| shared.iter().filter(|c| before.get(c) != now.get(c)).count())
            .sum();

        TableDelta {
            rows_before: self.len(),
            rows_after: after.len(),
            columns_added,
            columns_removed,
            cells_changed,
        }
    }
}

/// Difference between a stage's input and output table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDelta {
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_added: Vec<String>,
    pub columns_removed: Vec<String>,
    /// Cells that differ in rows and columns present on both sides.
    pub cells_changed: usize,
}

impl TableDelta {
    /// True when the stage left the table as it was.
    pub fn is_unchanged(&self) -> bool {
        self.rows_before == self.rows_after
            && self.columns_added.is_empty()
            && self.columns_removed.is_empty()
            && self.cells_changed == 0
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        if self.is_unchanged() {
            return "no changes".to_string();
        }
        let mut parts = Vec::new();
        if self.cells_changed > 0 {
            parts.push(format!("{} cells changed", self.cells_changed));
        }
        if self.rows_after != self.rows_before {
            parts.push(format!("rows {} → {}", self.rows_before, self.rows_after));
        }
        if !self.columns_added.is_empty() {
            parts.push(format!("added [{}]", self.columns_added.join(", ")));
        }
        if !self.columns_removed.is_empty() {
            parts.push(format!("removed [{}]", self.columns_removed.join(", ")));
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Table {
        let headers = vec!["type".to_string(), "name".to_string(), "label".to_string()];
        let records = vec![
            vec!["text".to_string(), "q1".to_string(), "Question 1".to_string()],
            vec!["note".to_string(), "nan".to_string()],
        ];
        Table::from_records(&headers, &records)
    }

    #[test]
    fn test_blank_cells_not_stored() {
        let table = sample();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].name(), None);
        assert_eq!(table.rows()[1].get("label"), None);
        assert_eq!(table.rows()[1].cells().count(), 1);
    }

    #[test]
    fn test_set_blank_clears() {
        let mut row = Row::from_pairs([("type", "text"), ("default", "5")]);
        row.set("default", "");
        assert!(row.is_blank("default"));
        row.set("default", "NaN");
        assert!(row.is_blank("default"));
    }

    #[test]
    fn test_field_type_trimmed() {
        let row = Row::from_pairs([("type", "  begin group ")]);
        assert_eq!(row.field_type(), Some("begin group"));
    }

    #[test]
    fn test_records_round_trip_shape() {
        let table = sample();
        let records = table.to_records();
        assert_eq!(records[1], vec!["note", "", ""]);
    }

    #[test]
    fn test_push_row_extends_columns() {
        let mut table = sample();
        table.push_row(Row::from_pairs([("type", "end group"), ("appearance", "field-list")]));
        assert_eq!(table.columns(), &["type", "name", "label", "appearance"]);
    }

    #[test]
    fn test_drop_columns() {
        let mut table = sample();
        table.drop_columns(|c| c == "label");
        assert!(!table.has_column("label"));
        assert_eq!(table.rows()[0].get("label"), None);
        assert_eq!(table.rows()[0].name(), Some("q1"));
    }

    #[test]
    fn test_delta() {
        let before = sample();
        let mut after = before.clone();
        after.rows_mut()[0].set("type", "integer");
        after.ensure_column("hint");
        after.push_row(Row::from_pairs([("type", "end group")]));

        let delta = before.delta(&after);
        assert_eq!(delta.cells_changed, 1);
        assert_eq!(delta.rows_after, 3);
        assert_eq!(delta.columns_added, vec!["hint"]);
        assert!(!delta.is_unchanged());
        assert!(before.delta(&before).is_unchanged());
    }

    #[test]
    fn test_deserialize_repairs_header() {
        let table: Table = serde_json::from_value(json!({
            "columns": ["type"],
            "rows": [{"type": "text", "name": "q1"}, {"type": ""}, {"default": 5, "hint": null}]
        }))
        .unwrap();
        assert_eq!(table.columns(), &["type", "name", "default"]);
        assert!(table.rows()[1].is_empty());
        assert_eq!(table.rows()[2].get("default"), Some("5"));
    }
}
