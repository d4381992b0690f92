//! Errors raised by the policy services.

use super::policy::DenyReason;
use crate::repository::StoreError;

/// Failures of a policy or form operation.
///
/// The policy gate returns quota and expiry denials as decisions; the form
/// services surface them as [`PolicyError::Denied`].
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Malformed input. Nothing was changed.
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    Denied(DenyReason),

    /// Underlying storage failed. Not retried.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl PolicyError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        PolicyError::Validation {
            field,
            message: message.into(),
        }
    }
}

pub type PolicyResult<T> = Result<T, PolicyError>;
