//! Domain layer for the Formlink backend.
//!
//! This crate contains:
//! - Domain models (policy settings, subscriptions, forms, submissions)
//! - Repository traits the storage layer implements, plus an in-memory store
//! - The restriction policy engine (settings, exemption, quota, expiry, gate)

pub mod models;
pub mod repository;
pub mod services;
