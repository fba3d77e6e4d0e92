//! Request and response bodies of the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::transform::pipeline::{ConvertOptions, ConvertedForm, StageReport};
use crate::workbook::Workbook;

/// Body of `POST /api/convert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    /// SurveyCTO sheets in the JSON workbook layout.
    pub workbook: Workbook,

    /// Form title; also the source of the generated `form_id`.
    pub form_name: String,

    /// Overrides the server's default language.
    #[serde(default)]
    pub default_language: Option<String>,
}

impl ConvertRequest {
    /// Options for this request on top of the server defaults.
    pub fn options(&self, defaults: &ConvertOptions) -> ConvertOptions {
        ConvertOptions {
            form_name: self.form_name.clone(),
            default_language: self
                .default_language
                .clone()
                .unwrap_or_else(|| defaults.default_language.clone()),
            ..defaults.clone()
        }
    }
}

/// Response of `POST /api/convert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub job_id: String,

    /// `ready` when the form conforms, `warning` otherwise.
    pub status: String,

    pub converted_at: DateTime<Utc>,

    /// Kobo sheets in the JSON workbook layout.
    pub workbook: Workbook,

    pub reports: Vec<StageReport>,

    pub violations: Vec<String>,
}

impl From<ConvertedForm> for ConvertResponse {
    fn from(form: ConvertedForm) -> Self {
        let status = if form.violations.is_empty() { "ready" } else { "warning" };
        let reports = form.reports.clone();
        let violations = form.violations.clone();

        ConvertResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            converted_at: Utc::now(),
            workbook: form.into_workbook(),
            reports,
            violations,
        }
    }
}

/// JSON body for a failed request.
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "workbook": null,
        "reports": [],
        "violations": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Row, Table};
    use crate::transform::pipeline::run_pipeline;

    #[test]
    fn test_request_from_json() {
        let body = json!({
            "workbook": {
                "survey": {
                    "columns": ["type", "name", "label"],
                    "rows": [{ "type": "text", "name": "Q1", "label": "First" }]
                }
            },
            "formName": "Pilot"
        });

        let request: ConvertRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.form_name, "Pilot");
        assert!(request.workbook.choices.is_none());

        let options = request.options(&ConvertOptions::default());
        assert_eq!(options.form_name, "Pilot");
        assert_eq!(options.default_language, "English");
    }

    #[test]
    fn test_language_override() {
        let request = ConvertRequest {
            workbook: Workbook::default(),
            form_name: "F".to_string(),
            default_language: Some("Arabic".to_string()),
        };
        assert_eq!(request.options(&ConvertOptions::default()).default_language, "Arabic");
    }

    #[test]
    fn test_response_from_form() {
        let mut survey = Table::with_columns(["type", "name"]);
        survey.push_row(Row::from_pairs([("type", "text"), ("name", "q")]));
        let form = run_pipeline(Some(survey), None, None, &ConvertOptions::default()).unwrap();
        let report_count = form.reports.len();

        let response = ConvertResponse::from(form);
        assert_eq!(response.status, "ready");
        assert_eq!(response.reports.len(), report_count);
        assert!(response.workbook.settings.is_some());
        assert!(Uuid::parse_str(&response.job_id).is_ok());

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("convertedAt").is_some());
        assert_eq!(json["workbook"]["survey"]["rows"][0]["name"], "q");
    }

    #[test]
    fn test_error_response_shape() {
        let body = error_response("Workbook has no survey sheet");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "Workbook has no survey sheet");
    }
}
