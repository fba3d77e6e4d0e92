//! Field type repair.
//!
//! Each row's `type` is checked in a fixed order:
//!
//! 1. SurveyCTO-only metadata types (`deviceid`, `text audit`, ...) → `text`
//! 2. `select_one` lists that pointed at the old location lists → the
//!    canonical `governorate` / `district` / `subdistrict` lists
//! 3. anything else outside the Kobo vocabulary → `text`

use crate::models::{Column, Table};

/// Free-text type used as the fallback for anything unsupported.
pub const TEXT_TYPE: &str = "text";

/// Types with no Kobo equivalent.
const UNSUPPORTED_TYPES: [&str; 9] = [
    "deviceid",
    "username",
    "subscriberid",
    "simserial",
    "phonenumber",
    "caseid",
    "text audit",
    "comments",
    "audit",
];

/// Types Kobo accepts as written.
const STANDARD_TYPES: [&str; 25] = [
    "text",
    "integer",
    "decimal",
    "select_one",
    "select_multiple",
    "note",
    "geopoint",
    "geotrace",
    "geoshape",
    "date",
    "time",
    "dateTime",
    "image",
    "audio",
    "video",
    "file",
    "barcode",
    "calculate",
    "acknowledge",
    "hidden",
    "xml-external",
    "begin group",
    "end group",
    "begin repeat",
    "end repeat",
];

const SELECT_ONE_PREFIX: &str = "select_one ";
const SELECT_MULTIPLE_PREFIX: &str = "select_multiple ";

/// Legacy list-name fragment → replacement type.
const LEGACY_LIST_REMAPS: [(&str, &str); 3] = [
    ("sGovernorate", "select_one governorate"),
    ("sDistrict", "select_one district"),
    ("sSubdistrict", "select_one subdistrict"),
];

/// True when Kobo accepts the type: an exact vocabulary entry, or a
/// `select_one`/`select_multiple` followed by any list name.
pub fn is_standard_type(value: &str) -> bool {
    STANDARD_TYPES.contains(&value)
        || value.starts_with(SELECT_ONE_PREFIX)
        || value.starts_with(SELECT_MULTIPLE_PREFIX)
}

/// Replacement for one trimmed type value.
fn fixed_type(value: &str) -> &str {
    if UNSUPPORTED_TYPES.contains(&value) {
        return TEXT_TYPE;
    }
    if value.starts_with(SELECT_ONE_PREFIX) {
        return LEGACY_LIST_REMAPS
            .iter()
            .find(|(fragment, _)| value.contains(fragment))
            .map_or(value, |(_, replacement)| *replacement);
    }
    if !is_standard_type(value) {
        return TEXT_TYPE;
    }
    value
}

/// Rewrite every non-blank `type` cell into the Kobo vocabulary.
///
/// Blank types are left blank. Surrounding whitespace is trimmed.
pub fn fix_field_types(survey: &Table) -> Table {
    let mut out = survey.clone();
    for row in out.rows_mut() {
        let Some(current) = row.field_type() else {
            continue;
        };
        let fixed = fixed_type(current).to_string();
        if row.get(Column::Type) != Some(fixed.as_str()) {
            row.set(Column::Type.as_str(), fixed);
        }
    }
    out
}
