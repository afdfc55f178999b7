//! Command handlers for the promptlint CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod check;
pub mod render;
pub mod schema;
pub mod vars;

// Re-export command types for convenience
pub use check::CheckCommand;
pub use render::RenderCommand;
pub use schema::SchemaCommand;
pub use vars::VarsCommand;

use promptlint_core::{AppError, AppResult};
use promptlint_lint::{load_document, parse_document, ParsedDocument};
use std::path::Path;

/// Read one document for the single-file commands.
///
/// Unterminated front matter is tolerated: the whole text is treated as body.
pub(crate) fn read_parsed(path: &Path, workspace: &Path) -> AppResult<ParsedDocument> {
    if !path.is_file() {
        return Err(AppError::Config(format!("Document not found: {:?}", path)));
    }

    let doc = load_document(path, workspace)?;
    Ok(parse_document(&doc).unwrap_or_else(|e| {
        tracing::warn!("{}: {}", doc.id, e);
        ParsedDocument::without_front_matter(&doc)
    }))
}
