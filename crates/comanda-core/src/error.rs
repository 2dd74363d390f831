// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Comanda ordering backend.

use thiserror::Error;

/// The primary error type used across all Comanda collaborator traits and
/// core operations.
///
/// `Duplicate` order submissions are deliberately NOT an error variant:
/// they are a recognized idempotent no-op encoded in
/// [`crate::types::CommitDisposition`].
#[derive(Debug, Error)]
pub enum ComandaError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, rolled-back transaction).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An order payload failed validation. Always names the offending field
    /// or product; never silently corrected.
    #[error("validation error on {field}: {message}")]
    Validation { field: String, message: String },

    /// Catalog or persistence temporarily unreachable. The caller may retry
    /// the whole inbound event.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Reply-generation provider errors (API failure, malformed reply).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
