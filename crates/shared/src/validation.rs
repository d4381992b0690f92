//! Common validation utilities.

use validator::ValidationError;

/// Maximum number of top-level keys accepted in a submission or styling object.
pub const MAX_OBJECT_KEYS: usize = 100;

/// Styling keys that must hold a CSS hex color.
const COLOR_KEYS: &[&str] = &[
    "primaryColor",
    "backgroundColor",
    "textColor",
    "buttonColor",
    "buttonTextColor",
];

lazy_static::lazy_static! {
    static ref HEX_COLOR_REGEX: regex::Regex =
        regex::Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap();
    static ref TEMPLATE_REGEX: regex::Regex = regex::Regex::new(r"^[a-z0-9][a-z0-9_-]{0,49}$").unwrap();
    static ref SHARE_ID_REGEX: regex::Regex = regex::Regex::new(r"^[A-Za-z0-9]{6,32}$").unwrap();
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates a CSS hex color (`#rgb`, `#rrggbb` or `#rrggbbaa`).
pub fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    if HEX_COLOR_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(error("hex_color", "Color must be a hex value like #1a2b3c"))
    }
}

/// Validates a template identifier (lowercase slug, max 50 chars).
pub fn validate_template_name(value: &str) -> Result<(), ValidationError> {
    if TEMPLATE_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(error(
            "template_name",
            "Template must be a lowercase slug of at most 50 characters",
        ))
    }
}

/// Validates the shape of a public share id.
pub fn validate_share_id(value: &str) -> Result<(), ValidationError> {
    if SHARE_ID_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(error("share_id", "Invalid form id"))
    }
}

/// Validates that a JSON value is an object with a bounded number of keys.
pub fn validate_json_object(value: &serde_json::Value) -> Result<(), ValidationError> {
    match value.as_object() {
        Some(map) if map.len() <= MAX_OBJECT_KEYS => Ok(()),
        Some(_) => Err(error("object_too_large", "Object has too many keys")),
        None => Err(error("object_required", "Value must be a JSON object")),
    }
}

/// Validates a styling object: a JSON object whose color keys hold hex colors.
pub fn validate_styling(value: &serde_json::Value) -> Result<(), ValidationError> {
    validate_json_object(value)?;

    for key in COLOR_KEYS {
        if let Some(color) = value.get(*key) {
            match color.as_str() {
                Some(c) => validate_hex_color(c)?,
                None => return Err(error("hex_color", "Color must be a string")),
            }
        }
    }

    Ok(())
}

/// Validates that a JSON value is an array of field definitions (objects).
pub fn validate_fields(value: &serde_json::Value) -> Result<(), ValidationError> {
    match value.as_array() {
        Some(items) if items.len() > MAX_OBJECT_KEYS => {
            Err(error("too_many_fields", "Form has too many fields"))
        }
        Some(items) if items.iter().all(|f| f.is_object()) => Ok(()),
        Some(_) => Err(error("field_shape", "Each field must be a JSON object")),
        None => Err(error("array_required", "Fields must be a JSON array")),
    }
}
