//! Field name normalization.
//!
//! Kobo field names must be lowercase machine names and unique across the
//! form. Names are normalized with [`normalize_token`]; collisions get an
//! incrementing `_N` suffix per base name, in row order:
//!
//! ```text
//! Age, Age, age!   →   age, age_1, age_2
//! ```

use std::collections::{HashMap, HashSet};

use crate::models::{Column, Table};
use crate::text::normalize_token;

/// Hands out unique names in row order.
#[derive(Debug, Default)]
struct NameAllocator {
    /// Last suffix used per base name.
    counters: HashMap<String, usize>,
    /// Every name emitted so far.
    used: HashSet<String>,
}

impl NameAllocator {
    fn allocate(&mut self, base: String) -> String {
        let Some(counter) = self.counters.get_mut(&base) else {
            self.counters.insert(base.clone(), 0);
            return self.claim(base);
        };
        // Skip suffixes already taken by a literal name such as `age_1`.
        loop {
            *counter += 1;
            let candidate = format!("{}_{}", base, counter);
            if !self.used.contains(&candidate) {
                return self.claim(candidate);
            }
        }
    }

    fn claim(&mut self, name: String) -> String {
        if !self.used.insert(name.clone()) {
            // A generated suffix already produced this exact name; treat the
            // literal as a fresh collision on itself.
            return self.allocate(name);
        }
        name
    }
}

/// Normalize every non-blank field name and make the set unique.
///
/// Blank names pass through untouched and are not counted. A name that
/// normalizes to nothing (e.g. only punctuation) becomes blank.
pub fn ensure_unique_names(survey: &Table) -> Table {
    let mut out = survey.clone();
    let mut names = NameAllocator::default();

    for row in out.rows_mut() {
        let Some(raw) = row.name() else {
            continue;
        };
        let base = normalize_token(Some(raw));
        if base.is_empty() {
            row.clear(Column::Name);
            continue;
        }
        let unique = names.allocate(base);
        row.set(Column::Name.as_str(), unique);
    }
    out
}
