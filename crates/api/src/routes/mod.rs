//! HTTP route handlers.

pub mod admin_settings;
pub mod forms;
pub mod health;
pub mod payments;
pub mod public_forms;
pub mod subscriptions;
