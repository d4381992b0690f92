//! Formlink API library.
//!
//! Exposes the router, configuration and background jobs so the binary and
//! the integration tests build the service the same way.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod jobs;
pub mod middleware;
pub mod routes;
