//! Promptlint Core Library
//!
//! This crate provides the foundational utilities shared by the linter crates:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (`AppConfig`, `LintSettings`)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, LintSettings, SectionKeywords};
pub use error::{AppError, AppResult};
