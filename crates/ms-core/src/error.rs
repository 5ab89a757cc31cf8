//! # AppError
//!
//! Centralized error handling for the Mediashare ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all ms-core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// Resource not found (e.g., MediaItem, User). Inactive media counts as missing.
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., score out of range, comment too long)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// No caller could be identified
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is known but lacks the role or ownership required
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Infrastructure failure (e.g., DB down, disk full)
    #[error("internal service error: {0}")]
    Internal(String),

    /// Uniqueness race the storage layer could not resolve, or duplicate username
    #[error("conflict: {0}")]
    Conflict(String),
}

impl AppError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        AppError::NotFound(entity.to_string(), id.to_string())
    }
}

/// A specialized Result type for Mediashare logic.
pub type Result<T> = std::result::Result<T, AppError>;
