//! Expression cleanup for calculations, constraints and skip logic.
//!
//! This is a textual denylist scan, not a parser. Rows whose expressions
//! contain a SurveyCTO-only function, malformed conditional syntax or an
//! unresolved `${field}` reference are downgraded to plain text questions
//! and lose their calculation.

use super::field_types::TEXT_TYPE;
use crate::models::{Column, Row, Table};

/// Fragments that Kobo cannot evaluate.
pub const UNSAFE_EXPRESSION_FRAGMENTS: [&str; 10] = [
    "pulldata(",
    "duration(",
    "if(<",
    "if(=",
    "if(,)",
    "selected(,)",
    "(+())",
    "(*1)",
    "(*2)",
    "${",
];

/// Columns holding XPath expressions.
const EXPRESSION_COLUMNS: [Column; 5] = [
    Column::Calculation,
    Column::Required,
    Column::Relevant,
    Column::Constraint,
    Column::ChoiceFilter,
];

/// True when the text contains any denylisted fragment.
pub fn has_unsafe_expression(value: &str) -> bool {
    UNSAFE_EXPRESSION_FRAGMENTS
        .iter()
        .any(|fragment| value.contains(fragment))
}

fn row_has_unsafe_expression(row: &Row) -> bool {
    EXPRESSION_COLUMNS
        .iter()
        .filter_map(|c| row.get(c))
        .any(has_unsafe_expression)
}

/// Force rows with unsafe expressions to `text` and blank their calculation.
///
/// Tables without a `type` column are returned unchanged.
pub fn clean_calculation_fields(survey: &Table) -> Table {
    let mut out = survey.clone();
    if !out.has_column(Column::Type) {
        return out;
    }
    for row in out.rows_mut() {
        if row_has_unsafe_expression(row) {
            row.set(Column::Type.as_str(), TEXT_TYPE);
            row.clear(Column::Calculation);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey(rows: Vec<Vec<(&str, &str)>>) -> Table {
        let mut t = Table::with_columns(["type", "name", "calculation", "relevant", "constraint"]);
        for r in rows {
            t.push_row(Row::from_pairs(r));
        }
        t
    }

    #[test]
    fn test_denylist() {
        assert!(has_unsafe_expression("pulldata('hh', 'size', 'id', ${id})"));
        assert!(has_unsafe_expression("duration()"));
        assert!(has_unsafe_expression("if(<5, 1, 0)"));
        assert!(has_unsafe_expression("selected(,)"));
        assert!(has_unsafe_expression("(+())"));
        assert!(has_unsafe_expression("${age} > 18"));
        assert!(!has_unsafe_expression(". > 0 and . < 120"));
        assert!(!has_unsafe_expression("if(. > 5, 'big', 'small')"));
    }

    #[test]
    fn test_unsafe_calculation_downgraded() {
        let input = survey(vec![vec![
            ("type", "calculate"),
            ("name", "hh_size"),
            ("calculation", "pulldata('hh', 'size', 'id', 1)"),
        ]]);

        let out = clean_calculation_fields(&input);
        let row = &out.rows()[0];
        assert_eq!(row.get("type"), Some("text"));
        assert_eq!(row.get("calculation"), None);
        assert_eq!(row.name(), Some("hh_size"));
    }

    #[test]
    fn test_unsafe_relevant_clears_calculation() {
        let input = survey(vec![vec![
            ("type", "calculate"),
            ("name", "total"),
            ("calculation", "1 + 1"),
            ("relevant", "${consent} = 'yes'"),
        ]]);

        let out = clean_calculation_fields(&input);
        let row = &out.rows()[0];
        assert_eq!(row.get("type"), Some("text"));
        assert_eq!(row.get("calculation"), None);
        // only type and calculation are touched
        assert_eq!(row.get("relevant"), Some("${consent} = 'yes'"));
    }

    #[test]
    fn test_required_and_choice_filter_scanned() {
        let mut input = Table::with_columns(["type", "name", "calculation", "required", "choice_filter"]);
        input.push_row(Row::from_pairs([
            ("type", "calculate"),
            ("name", "flag"),
            ("calculation", "1 + 1"),
            ("required", "${x} = 1"),
        ]));
        input.push_row(Row::from_pairs([
            ("type", "select_one district"),
            ("name", "district"),
            ("calculation", "0"),
            ("choice_filter", "pulldata('a', 'b', 'c', 1)"),
        ]));
        input.push_row(Row::from_pairs([
            ("type", "select_one yes_no"),
            ("name", "ok"),
            ("required", "yes"),
            ("choice_filter", "filter = 'a'"),
        ]));

        let out = clean_calculation_fields(&input);
        for row in &out.rows()[..2] {
            assert_eq!(row.get("type"), Some("text"));
            assert_eq!(row.get("calculation"), None);
        }
        assert_eq!(out.rows()[1].get("choice_filter"), Some("pulldata('a', 'b', 'c', 1)"));
        assert_eq!(out.rows()[2], input.rows()[2]);
    }

    #[test]
    fn test_each_fragment_downgrades_row() {
        for expr in ["duration()", "if(,)", "(*1)", "selected(,)", "if(<3)"] {
            let input = survey(vec![vec![
                ("type", "calculate"),
                ("name", "c"),
                ("calculation", "1"),
                ("constraint", expr),
            ]]);
            let out = clean_calculation_fields(&input);
            assert_eq!(out.rows()[0].get("type"), Some("text"), "{}", expr);
            assert_eq!(out.rows()[0].get("calculation"), None, "{}", expr);
        }
    }

    #[test]
    fn test_safe_rows_untouched() {
        let input = survey(vec![
            vec![("type", "integer"), ("name", "age"), ("constraint", ". >= 0")],
            vec![("type", "calculate"), ("name", "double"), ("calculation", "2 * 3")],
        ]);

        assert_eq!(clean_calculation_fields(&input), input);
    }

    #[test]
    fn test_no_type_column() {
        let mut input = Table::with_columns(["name", "calculation"]);
        input.push_row(Row::from_pairs([("name", "x"), ("calculation", "duration()")]));

        assert_eq!(clean_calculation_fields(&input), input);
    }

    #[test]
    fn test_idempotent() {
        let input = survey(vec![
            vec![("type", "calculate"), ("name", "a"), ("calculation", "(*2)")],
            vec![("type", "integer"), ("name", "b"), ("constraint", "if(=1)")],
        ]);
        let once = clean_calculation_fields(&input);
        assert_eq!(clean_calculation_fields(&once), once);
    }
}
