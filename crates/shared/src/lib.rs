//! Shared utilities and common types for the Formlink backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (webhook signatures, share ids, payment references)
//! - JWT verification for identity-provider tokens
//! - Cursor pagination
//! - Common validation logic

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod validation;
