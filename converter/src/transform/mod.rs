//! Transformation module.
//!
//! One module per pipeline stage, each a pure `&Table -> Table` function:
//! - Language: canonical `label::`/`hint::` columns
//! - Field types: Kobo type vocabulary
//! - Fallbacks: placeholder labels and hints
//! - Expressions / Defaults: denylist cleanup
//! - Names: normalized, unique field names
//! - Structure: group/repeat balancing
//! - Cascading: location hierarchy lists
//! - Settings: title, id and language
//! - Columns: redundant column pruning
//! - Pipeline: stage order, state and reports

pub mod cascading;
pub mod columns;
pub mod defaults;
pub mod expressions;
pub mod fallbacks;
pub mod field_types;
pub mod language;
pub mod names;
pub mod pipeline;
pub mod settings;
pub mod structure;

pub use cascading::fix_cascading_selects;
pub use columns::remove_redundant_columns;
pub use defaults::clean_default_values;
pub use expressions::clean_calculation_fields;
pub use fallbacks::apply_fallbacks;
pub use field_types::fix_field_types;
pub use language::normalize_language_columns;
pub use names::ensure_unique_names;
pub use pipeline::*;
pub use settings::fix_settings_sheet;
pub use structure::validate_group_repeat_logic;
