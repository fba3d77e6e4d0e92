//! The SurveyCTO → Kobo conversion pipeline.
//!
//! Ten stages run in a fixed order over an immutable [`PipelineState`]
//! holding the survey, choices and settings sheets. Every stage takes the
//! current state and returns a new one, so any prefix of the pipeline can be
//! replayed (see [`Stage::apply`]) and a hosting UI can show the sheets
//! between steps.
//!
//! # Example
//!
//! ```rust
//! use formbridge::models::{Row, Table};
//! use formbridge::transform::pipeline::{run_pipeline, ConvertOptions};
//!
//! let mut survey = Table::with_columns(["type", "name", "label"]);
//! survey.push_row(Row::from_pairs([("type", "deviceid"), ("name", "Device ID"), ("label", "Device")]));
//!
//! let options = ConvertOptions {
//!     form_name: "Household Survey".to_string(),
//!     ..ConvertOptions::default()
//! };
//! let form = run_pipeline(Some(survey), None, None, &options).unwrap();
//!
//! let row = &form.survey.rows()[0];
//! assert_eq!(row.get("type"), Some("text"));
//! assert_eq!(row.get("name"), Some("device_id"));
//! assert_eq!(form.settings.rows()[0].get("form_id"), Some("household_survey"));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::cascading::fix_cascading_selects;
use super::columns::remove_redundant_columns;
use super::defaults::clean_default_values;
use super::expressions::clean_calculation_fields;
use super::fallbacks::apply_fallbacks;
use super::field_types::fix_field_types;
use super::language::normalize_language_columns;
use super::names::ensure_unique_names;
use super::settings::{fix_settings_sheet, DEFAULT_LANGUAGE};
use super::structure::validate_group_repeat_logic;
use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_success_indent, log_warning};
use crate::error::{PipelineError, PipelineResult, WorkbookResult};
use crate::models::{Column, LocationHierarchy, SheetKind, Table, TableDelta};
use crate::validation::validate_form;
use crate::workbook::{parse_sheet_bytes, Workbook};

// =============================================================================
// Options
// =============================================================================

/// Options for a conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Human-readable form title; also the source of `form_id`.
    pub form_name: String,

    /// Language forced onto the settings sheet.
    pub default_language: String,

    /// Lists written into `choices` by the cascading stage.
    pub hierarchy: LocationHierarchy,

    /// Skip conformance checks after the last stage.
    pub skip_validation: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            form_name: "Untitled Form".to_string(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            hierarchy: LocationHierarchy::default(),
            skip_validation: false,
        }
    }
}

// =============================================================================
// Stages
// =============================================================================

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    LanguageColumns,
    FieldTypes,
    Fallbacks,
    Expressions,
    Defaults,
    FieldNames,
    GroupsAndRepeats,
    CascadingSelects,
    Settings,
    RedundantColumns,
}

impl Stage {
    pub const ALL: [Stage; 10] = [
        Stage::LanguageColumns,
        Stage::FieldTypes,
        Stage::Fallbacks,
        Stage::Expressions,
        Stage::Defaults,
        Stage::FieldNames,
        Stage::GroupsAndRepeats,
        Stage::CascadingSelects,
        Stage::Settings,
        Stage::RedundantColumns,
    ];

    /// Display name.
    pub const fn title(self) -> &'static str {
        match self {
            Stage::LanguageColumns => "Normalize language columns",
            Stage::FieldTypes => "Fix field types",
            Stage::Fallbacks => "Fill missing labels and hints",
            Stage::Expressions => "Clean unsafe expressions",
            Stage::Defaults => "Clean default values",
            Stage::FieldNames => "Normalize field names",
            Stage::GroupsAndRepeats => "Balance groups and repeats",
            Stage::CascadingSelects => "Reset cascading selects",
            Stage::Settings => "Fix settings sheet",
            Stage::RedundantColumns => "Remove redundant columns",
        }
    }

    /// Sheets this stage may change.
    pub const fn sheets(self) -> &'static [SheetKind] {
        match self {
            Stage::LanguageColumns | Stage::RedundantColumns => {
                &[SheetKind::Survey, SheetKind::Choices]
            }
            Stage::CascadingSelects => &[SheetKind::Choices],
            Stage::Settings => &[SheetKind::Settings],
            _ => &[SheetKind::Survey],
        }
    }

    /// Run this stage on `state`, returning the next state.
    pub fn apply(self, state: &PipelineState, options: &ConvertOptions) -> PipelineState {
        let PipelineState { survey, choices, settings } = state;
        match self {
            Stage::LanguageColumns => PipelineState {
                survey: normalize_language_columns(survey),
                choices: normalize_language_columns(choices),
                settings: settings.clone(),
            },
            Stage::FieldTypes => state.with_survey(fix_field_types(survey)),
            Stage::Fallbacks => state.with_survey(apply_fallbacks(survey)),
            Stage::Expressions => state.with_survey(clean_calculation_fields(survey)),
            Stage::Defaults => state.with_survey(clean_default_values(survey)),
            Stage::FieldNames => state.with_survey(ensure_unique_names(survey)),
            Stage::GroupsAndRepeats => state.with_survey(validate_group_repeat_logic(survey)),
            Stage::CascadingSelects => PipelineState {
                choices: fix_cascading_selects(Some(choices), &options.hierarchy),
                ..state.clone()
            },
            Stage::Settings => PipelineState {
                settings: fix_settings_sheet(
                    Some(settings),
                    &options.form_name,
                    &options.default_language,
                ),
                ..state.clone()
            },
            Stage::RedundantColumns => PipelineState {
                survey: remove_redundant_columns(survey),
                choices: remove_redundant_columns(choices),
                settings: settings.clone(),
            },
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

// =============================================================================
// State
// =============================================================================

/// The three sheets between two stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    pub survey: Table,
    pub choices: Table,
    pub settings: Table,
}

impl PipelineState {
    /// Initial state from raw sheets.
    ///
    /// A missing survey is fatal. Missing choices start as an empty
    /// `list_name, name, label` sheet; missing settings start empty and are
    /// synthesized by the settings stage.
    pub fn new(
        survey: Option<Table>,
        choices: Option<Table>,
        settings: Option<Table>,
    ) -> PipelineResult<Self> {
        let survey = survey.ok_or(PipelineError::MissingSurvey)?;
        let choices = choices.unwrap_or_else(|| {
            Table::with_columns([
                Column::ListName.as_str(),
                Column::Name.as_str(),
                Column::Label.as_str(),
            ])
        });
        Ok(Self {
            survey,
            choices,
            settings: settings.unwrap_or_default(),
        })
    }

    pub fn sheet(&self, kind: SheetKind) -> &Table {
        match kind {
            SheetKind::Survey => &self.survey,
            SheetKind::Choices => &self.choices,
            SheetKind::Settings => &self.settings,
        }
    }

    /// Replace one sheet with edited CSV bytes.
    ///
    /// On a parse error the error is returned and `self` is left as it was.
    pub fn replace_sheet(&self, kind: SheetKind, bytes: &[u8]) -> WorkbookResult<Self> {
        let parsed = parse_sheet_bytes(kind.as_str(), bytes)?;
        let mut next = self.clone();
        match kind {
            SheetKind::Survey => next.survey = parsed.table,
            SheetKind::Choices => next.choices = parsed.table,
            SheetKind::Settings => next.settings = parsed.table,
        }
        Ok(next)
    }

    fn with_survey(&self, survey: Table) -> Self {
        Self {
            survey,
            choices: self.choices.clone(),
            settings: self.settings.clone(),
        }
    }
}

// =============================================================================
// Results
// =============================================================================

/// What one stage changed on one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
    pub stage: Stage,
    pub sheet: SheetKind,
    pub delta: TableDelta,
}

/// Final sheets of a conversion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedForm {
    pub survey: Table,
    pub choices: Table,
    pub settings: Table,

    /// One report per stage and sheet it touches, in execution order.
    pub reports: Vec<StageReport>,

    /// Conformance violations, empty when validation was skipped.
    pub violations: Vec<String>,
}

impl ConvertedForm {
    /// Sheets ready for writing, in survey, choices, settings order.
    pub fn into_workbook(self) -> Workbook {
        Workbook {
            survey: Some(self.survey),
            choices: Some(self.choices),
            settings: Some(self.settings),
        }
    }

    /// Number of stage/sheet pairs that changed something.
    pub fn changed_count(&self) -> usize {
        self.reports.iter().filter(|r| !r.delta.is_unchanged()).count()
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Run every stage over the three input sheets.
///
/// Only a missing survey fails. Everything else is repaired by the stages.
pub fn run_pipeline(
    survey: Option<Table>,
    choices: Option<Table>,
    settings: Option<Table>,
    options: &ConvertOptions,
) -> PipelineResult<ConvertedForm> {
    log_info(format!("🔄 Converting \"{}\"...", options.form_name));
    if survey.is_none() {
        log_error("No survey sheet, nothing to convert");
    }
    if choices.is_none() {
        log_warning("No choices sheet, starting from an empty one");
    }
    if settings.is_none() {
        log_warning("No settings sheet, it will be generated from the form name");
    }

    let mut state = PipelineState::new(survey, choices, settings)?;
    log_success(format!(
        "Read {} survey rows, {} choice rows",
        state.survey.len(),
        state.choices.len()
    ));

    let mut reports = Vec::new();
    for (i, stage) in Stage::ALL.iter().copied().enumerate() {
        log_info(format!("[{}/{}] {}", i + 1, Stage::ALL.len(), stage.title()));
        let next = stage.apply(&state, options);
        for &sheet in stage.sheets() {
            let delta = state.sheet(sheet).delta(next.sheet(sheet));
            let line = format!("{}: {}", sheet, delta.summary());
            if delta.is_unchanged() {
                log_info_indent(line, 1);
            } else {
                log_success_indent(line, 1);
            }
            reports.push(StageReport { stage, sheet, delta });
        }
        state = next;
    }

    let mut form = ConvertedForm {
        survey: state.survey,
        choices: state.choices,
        settings: state.settings,
        reports,
        violations: Vec::new(),
    };

    if options.skip_validation {
        log_info("(validation skipped)");
    } else {
        log_info("✔️  Validating converted form...");
        form.violations = validate_form(&form).iter().map(ToString::to_string).collect();
        if form.violations.is_empty() {
            log_success("Form conforms to Kobo rules");
        } else {
            log_warning(format!("{} violations found", form.violations.len()));
            for violation in form.violations.iter().take(5) {
                log_error(violation.as_str());
            }
        }
    }

    log_success(format!(
        "Done: {} survey rows, {} choice rows, {} settings rows",
        form.survey.len(),
        form.choices.len(),
        form.settings.len()
    ));
    Ok(form)
}

/// Convert a whole workbook.
pub fn convert_workbook(workbook: Workbook, options: &ConvertOptions) -> PipelineResult<ConvertedForm> {
    run_pipeline(workbook.survey, workbook.choices, workbook.settings, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Row;
    use crate::transform::structure::Marker;
    use std::collections::HashSet;

    fn options() -> ConvertOptions {
        ConvertOptions {
            form_name: "Baseline Survey".to_string(),
            ..ConvertOptions::default()
        }
    }

    fn surveycto_survey() -> Table {
        let mut t = Table::with_columns([
            "type",
            "name",
            "label",
            "label:العربية",
            "hint",
            "calculation",
            "default",
            "style",
            "media::audio",
        ]);
        let rows: Vec<Vec<(&str, &str)>> = vec![
            vec![("type", "deviceid"), ("name", "deviceid")],
            vec![("type", "begin group"), ("name", "Household"), ("label", "Household")],
            vec![("type", "begin repeat"), ("name", "Members"), ("label", "Members")],
            vec![("type", "text"), ("name", "Member Name"), ("label", "Name"), ("label:العربية", "الاسم")],
            vec![("type", "integer"), ("name", "Age"), ("label", "Age"), ("default", "${hh_age}")],
            vec![("type", "integer"), ("name", "age"), ("hint", "In years"), ("style", "bold")],
            vec![("type", "calculate"), ("name", "hh size"), ("calculation", "pulldata('hh','size','id',1)")],
            vec![("type", "select_one sGovernorateList"), ("name", "gov"), ("label", "Governorate")],
            vec![("type", "end group")],
        ];
        for r in rows {
            t.push_row(Row::from_pairs(r));
        }
        t
    }

    fn choices() -> Table {
        let mut t = Table::with_columns(["list_name", "name", "label", "label:العربية"]);
        t.push_row(Row::from_pairs([("list_name", "yes_no"), ("name", "1"), ("label", "Yes"), ("label:العربية", "نعم")]));
        t.push_row(Row::from_pairs([("list_name", "governorate"), ("name", "x"), ("label", "X")]));
        t
    }

    #[test]
    fn test_missing_survey_is_fatal() {
        let result = run_pipeline(None, Some(choices()), None, &options());
        assert!(matches!(result, Err(PipelineError::MissingSurvey)));
    }

    #[test]
    fn test_full_conversion_invariants() {
        let form = run_pipeline(Some(surveycto_survey()), Some(choices()), None, &options()).unwrap();
        let survey = &form.survey;

        // types repaired
        let types: Vec<_> = survey.rows().iter().map(|r| r.get("type")).collect();
        assert_eq!(types[0], Some("text"));
        assert_eq!(types[6], Some("text"));
        assert_eq!(types[7], Some("select_one governorate"));

        // names normalized and unique
        let names: Vec<_> = survey.rows().iter().filter_map(|r| r.name()).collect();
        assert!(names.contains(&"member_name"));
        assert!(names.contains(&"age") && names.contains(&"age_1"));
        assert_eq!(names.iter().collect::<HashSet<_>>().len(), names.len());

        // language columns canonical and complete on named rows
        assert!(survey.columns().iter().all(|c| !c.starts_with("label:") || c.starts_with("label::")));
        for row in survey.rows().iter().filter(|r| r.name().is_some()) {
            for column in Column::CANONICAL_LANGUAGE {
                assert!(!row.is_blank(column), "{:?} missing {}", row.name(), column);
            }
        }
        let member = survey.rows().iter().find(|r| r.name() == Some("member_name")).unwrap();
        assert_eq!(member.get("label::English"), Some("Name"));
        assert_eq!(member.get("label::Arabic"), Some("الاسم"));

        // dynamic default cleared, unsafe calculation dropped
        assert!(!survey.has_column("default"));
        assert!(!survey.has_column("calculation"));
        // unused and blank columns pruned
        assert!(!survey.has_column("style"));
        assert!(!survey.has_column("media::audio"));

        // repeat closed before the trailing rows end
        let last = survey.rows().last().unwrap();
        assert_eq!(Marker::of(last), Some(Marker::EndRepeat));
        assert_eq!(survey.len(), 10);

        // choices: seed replaces governorate, yes_no kept
        let lists: Vec<_> = form.choices.rows().iter().filter_map(|r| r.get("list_name")).collect();
        assert_eq!(lists.iter().filter(|l| **l == "yes_no").count(), 1);
        assert_eq!(lists.iter().filter(|l| **l == "governorate").count(), 3);
        assert!(form.choices.rows().iter().all(|r| r.name() != Some("x")));

        // settings synthesized
        let settings = &form.settings.rows()[0];
        assert_eq!(settings.get("form_title"), Some("Baseline Survey"));
        assert_eq!(settings.get("form_id"), Some("baseline_survey"));
        assert_eq!(settings.get("default_language"), Some("English"));
    }

    #[test]
    fn test_reports_follow_stage_order() {
        let form = run_pipeline(Some(surveycto_survey()), None, None, &options()).unwrap();
        let expected: usize = Stage::ALL.iter().map(|s| s.sheets().len()).sum();
        assert_eq!(form.reports.len(), expected);
        assert_eq!(form.reports[0].stage, Stage::LanguageColumns);
        assert_eq!(form.reports.last().unwrap().stage, Stage::RedundantColumns);

        let structure = form
            .reports
            .iter()
            .find(|r| r.stage == Stage::GroupsAndRepeats)
            .unwrap();
        assert_eq!(structure.delta.rows_after, structure.delta.rows_before + 1);
        assert!(form.changed_count() > 0);
    }

    #[test]
    fn test_missing_choices_synthesized() {
        let mut survey = Table::with_columns(["type", "name", "label"]);
        survey.push_row(Row::from_pairs([("type", "text"), ("name", "q"), ("label", "Q")]));

        let state = PipelineState::new(Some(survey.clone()), None, None).unwrap();
        assert_eq!(state.choices.columns(), ["list_name", "name", "label"]);
        assert!(state.choices.is_empty());

        let form = run_pipeline(Some(survey), None, None, &options()).unwrap();
        assert_eq!(form.choices.len(), LocationHierarchy::default().item_count());
    }

    #[test]
    fn test_stages_replay_to_same_result() {
        let opts = options();
        let mut state = PipelineState::new(Some(surveycto_survey()), Some(choices()), None).unwrap();
        for stage in Stage::ALL {
            state = stage.apply(&state, &opts);
        }

        let form = run_pipeline(Some(surveycto_survey()), Some(choices()), None, &opts).unwrap();
        assert_eq!(state.survey, form.survey);
        assert_eq!(state.choices, form.choices);
        assert_eq!(state.settings, form.settings);
    }

    #[test]
    fn test_apply_does_not_touch_input() {
        let state = PipelineState::new(Some(surveycto_survey()), Some(choices()), None).unwrap();
        let before = state.clone();
        let _ = Stage::FieldTypes.apply(&state, &options());
        assert_eq!(state, before);
    }

    #[test]
    fn test_replace_sheet() {
        let state = PipelineState::new(Some(surveycto_survey()), None, None).unwrap();

        let edited = state
            .replace_sheet(SheetKind::Survey, b"type,name\ntext,only_field\n")
            .unwrap();
        assert_eq!(edited.survey.len(), 1);
        assert_eq!(edited.choices, state.choices);

        let err = state.replace_sheet(SheetKind::Survey, b"");
        assert!(err.is_err());
        assert_eq!(state.survey.len(), 9);
    }

    #[test]
    fn test_custom_language_and_hierarchy() {
        let mut opts = options();
        opts.default_language = "Arabic".to_string();
        opts.hierarchy = LocationHierarchy { levels: Vec::new() };

        let form = run_pipeline(Some(surveycto_survey()), Some(choices()), None, &opts).unwrap();
        assert_eq!(form.settings.rows()[0].get("default_language"), Some("Arabic"));
        assert!(form.choices.rows().iter().any(|r| r.name() == Some("x")));
    }

    #[test]
    fn test_skip_validation() {
        let mut opts = options();
        opts.skip_validation = true;
        let form = run_pipeline(Some(surveycto_survey()), None, None, &opts).unwrap();
        assert!(form.violations.is_empty());
    }

    #[test]
    fn test_into_workbook() {
        let form = run_pipeline(Some(surveycto_survey()), None, None, &options()).unwrap();
        let survey = form.survey.clone();
        let workbook = form.into_workbook();
        assert!(workbook.missing_sheets().is_empty());
        assert_eq!(workbook.survey, Some(survey));
    }
}
