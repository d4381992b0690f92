//! Form submission models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

/// Data posted to a form through its share link.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub id: Uuid,
    pub form_id: String,
    /// Owner of the form (not the submitter, who is anonymous)
    pub user_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub data: Value,
}

/// POST /public/forms/:form_id/submissions request body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitFormRequest {
    #[validate(custom(function = "shared::validation::validate_json_object"))]
    pub data: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub form_id: String,
    pub submitted_at: DateTime<Utc>,
    pub data: Value,
}

impl From<Submission> for SubmissionResponse {
    fn from(s: Submission) -> Self {
        Self {
            id: s.id,
            form_id: s.form_id,
            submitted_at: s.submitted_at,
            data: s.data,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SubmissionListResponse {
    pub submissions: Vec<SubmissionResponse>,
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_request_requires_object() {
        let ok: SubmitFormRequest =
            serde_json::from_str(r#"{"data": {"email": "ada@example.com"}}"#).unwrap();
        assert!(ok.validate().is_ok());

        let bad: SubmitFormRequest = serde_json::from_str(r#"{"data": [1, 2, 3]}"#).unwrap();
        assert!(bad.validate().is_err());
    }
}
