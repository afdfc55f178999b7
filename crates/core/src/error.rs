//! Error types for promptlint.
//!
//! This module defines a unified error enum for everything that can stop a
//! run: configuration, schema configuration, I/O and serialization errors.
//! Problems found *in documents* are never errors; they are reported as
//! findings by the lint crate.

use thiserror::Error;

/// Unified error type for promptlint.
///
/// Every variant here is fatal to the run it occurs in.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Broken schema configuration (bad rule, unknown kind, clashing alias)
    #[error("Schema error: {0}")]
    Schema(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Linting pipeline errors (task failures, bad arguments to a command)
    #[error("Lint error: {0}")]
    Lint(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
