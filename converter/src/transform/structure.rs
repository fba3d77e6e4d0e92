//! Group and repeat balancing.
//!
//! Begin/end markers are matched with two independent stacks. Opens left
//! over after the scan get a synthesized closing row appended at the end of
//! the table: repeats first, innermost first, then groups.
//!
//! Only counts are balanced. An end marker seen before any open is ignored
//! and crossed pairs such as `begin group, begin repeat, end group, end repeat`
//! are accepted as written.

use crate::models::{Column, Row, Table};

pub const BEGIN_GROUP: &str = "begin group";
pub const END_GROUP: &str = "end group";
pub const BEGIN_REPEAT: &str = "begin repeat";
pub const END_REPEAT: &str = "end repeat";

/// Structural role of a survey row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    BeginGroup,
    EndGroup,
    BeginRepeat,
    EndRepeat,
}

impl Marker {
    /// Classify a row by its trimmed type.
    pub fn of(row: &Row) -> Option<Self> {
        match row.field_type()? {
            BEGIN_GROUP => Some(Marker::BeginGroup),
            END_GROUP => Some(Marker::EndGroup),
            BEGIN_REPEAT => Some(Marker::BeginRepeat),
            END_REPEAT => Some(Marker::EndRepeat),
            _ => None,
        }
    }
}

/// Positions of opens still waiting for their end marker.
#[derive(Debug, Default)]
struct OpenMarkers {
    groups: Vec<usize>,
    repeats: Vec<usize>,
}

impl OpenMarkers {
    fn scan(table: &Table) -> Self {
        let mut open = Self::default();
        for (i, row) in table.rows().iter().enumerate() {
            match Marker::of(row) {
                Some(Marker::BeginGroup) => open.groups.push(i),
                Some(Marker::BeginRepeat) => open.repeats.push(i),
                Some(Marker::EndGroup) => {
                    open.groups.pop();
                }
                Some(Marker::EndRepeat) => {
                    open.repeats.pop();
                }
                None => {}
            }
        }
        open
    }
}

/// Append closing rows for every unmatched begin group / begin repeat.
///
/// Existing rows keep their positions and contents.
pub fn validate_group_repeat_logic(survey: &Table) -> Table {
    let mut out = survey.clone();
    let open = OpenMarkers::scan(survey);

    let closers = open
        .repeats
        .iter()
        .rev()
        .map(|_| END_REPEAT)
        .chain(open.groups.iter().rev().map(|_| END_GROUP));

    for marker in closers {
        out.push_row(Row::from_pairs([(Column::Type.as_str(), marker)]));
    }
    out
}
