//! Form configuration domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Template applied when the creator does not pick one.
pub const DEFAULT_TEMPLATE: &str = "classic";

/// Button behaviours a form can be configured with.
pub const BUTTON_BEHAVIOURS: &[&str] = &["submit", "redirect", "reset"];

/// A configured form owned by a user.
///
/// `expires_at` is `None` when the owner is exempt or restrictions are
/// disabled; otherwise it is `created_at` plus the configured lifespan.
#[derive(Debug, Clone, PartialEq)]
pub struct FormConfig {
    /// Public share id used in links
    pub form_id: String,
    pub user_id: Uuid,
    pub title: String,
    pub template: String,
    pub styling: Value,
    pub button: Value,
    pub fields: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Append-only record of a form creation, used for daily quota counting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormCreationRecord {
    pub user_id: Uuid,
    pub form_id: String,
    pub created_at: DateTime<Utc>,
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

fn empty_object() -> Value {
    json!({})
}

fn empty_array() -> Value {
    json!([])
}

fn default_button() -> Value {
    json!({ "label": "Submit", "behaviour": "submit" })
}

/// Validates a button configuration object.
///
/// `label` (string, max 50 chars) and `behaviour` are required; a `redirect`
/// button also needs an http(s) `url`.
pub fn validate_button(value: &Value) -> Result<(), ValidationError> {
    let fail = |code: &'static str, message: &'static str| {
        let mut err = ValidationError::new(code);
        err.message = Some(message.into());
        Err(err)
    };

    let Some(button) = value.as_object() else {
        return fail("button_object", "Button must be a JSON object");
    };

    match button.get("label").and_then(Value::as_str) {
        Some(label) if !label.trim().is_empty() && label.chars().count() <= 50 => {}
        _ => return fail("button_label", "Button label must be 1-50 characters"),
    }

    match button.get("behaviour").and_then(Value::as_str) {
        Some("redirect") => match button.get("url").and_then(Value::as_str) {
            Some(url) if url.starts_with("https://") || url.starts_with("http://") => Ok(()),
            _ => fail("button_url", "Redirect buttons need an http(s) url"),
        },
        Some(b) if BUTTON_BEHAVIOURS.contains(&b) => Ok(()),
        _ => fail(
            "button_behaviour",
            "Button behaviour must be one of submit, redirect, reset",
        ),
    }
}

/// POST /forms request body.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateFormRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[serde(default = "default_template")]
    #[validate(custom(function = "shared::validation::validate_template_name"))]
    pub template: String,
    #[serde(default = "empty_object")]
    #[validate(custom(function = "shared::validation::validate_styling"))]
    pub styling: Value,
    #[serde(default = "default_button")]
    #[validate(custom(function = "validate_button"))]
    pub button: Value,
    #[serde(default = "empty_array")]
    #[validate(custom(function = "shared::validation::validate_fields"))]
    pub fields: Value,
}

/// PUT /forms/:form_id request body. Omitted fields keep their value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateFormRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(custom(function = "shared::validation::validate_template_name"))]
    pub template: Option<String>,
    #[validate(custom(function = "shared::validation::validate_styling"))]
    pub styling: Option<Value>,
    #[validate(custom(function = "validate_button"))]
    pub button: Option<Value>,
    #[validate(custom(function = "shared::validation::validate_fields"))]
    pub fields: Option<Value>,
}

impl UpdateFormRequest {
    /// Apply the provided changes to a form.
    pub fn apply(self, form: &mut FormConfig, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            form.title = title;
        }
        if let Some(template) = self.template {
            form.template = template;
        }
        if let Some(styling) = self.styling {
            form.styling = styling;
        }
        if let Some(button) = self.button {
            form.button = button;
        }
        if let Some(fields) = self.fields {
            form.fields = fields;
        }
        form.updated_at = now;
    }
}

/// Form as returned to its owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FormResponse {
    pub form_id: String,
    pub title: String,
    pub template: String,
    pub styling: Value,
    pub button: Value,
    pub fields: Value,
    pub share_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl FormResponse {
    /// Build the owner view; the share url is `{base_url}/f/{form_id}`.
    pub fn from_form(form: FormConfig, base_url: &str) -> Self {
        Self {
            share_url: format!("{}/f/{}", base_url.trim_end_matches('/'), form.form_id),
            form_id: form.form_id,
            title: form.title,
            template: form.template,
            styling: form.styling,
            button: form.button,
            fields: form.fields,
            created_at: form.created_at,
            updated_at: form.updated_at,
            expires_at: form.expires_at,
        }
    }
}

/// Form as served to anyone holding the link.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PublicFormResponse {
    pub form_id: String,
    pub title: String,
    pub template: String,
    pub styling: Value,
    pub button: Value,
    pub fields: Value,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<FormConfig> for PublicFormResponse {
    fn from(form: FormConfig) -> Self {
        Self {
            form_id: form.form_id,
            title: form.title,
            template: form.template,
            styling: form.styling,
            button: form.button,
            fields: form.fields,
            expires_at: form.expires_at,
        }
    }
}

/// Paginated list of the caller's forms.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FormListResponse {
    pub forms: Vec<FormResponse>,
    pub next_cursor: Option<String>,
}

/// Daily quota usage for the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct QuotaResponse {
    pub exempt: bool,
    pub restrictions_enabled: bool,
    pub used_today: u64,
    pub daily_limit: Option<i32>,
    pub remaining_today: Option<u64>,
}
