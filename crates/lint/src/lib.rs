//! Conformance checking for prompt-template documents.
//!
//! Each document is parsed into front matter and body, the front matter is
//! validated against a [`Schema`], the body's template placeholders are
//! cross-referenced with its declared variables, and every finding is
//! aggregated into a deterministic [`Report`].

pub mod frontmatter;
pub mod hygiene;
pub mod loader;
pub mod placeholder;
pub mod render;
pub mod report;
pub mod schema;
pub mod sections;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use frontmatter::{parse_document, ParseError, ParsedDocument};
pub use loader::{discover_documents, document_id, load_document};
pub use render::{render_template, RenderError};
pub use report::{DocumentReport, Report, Verdict};
pub use schema::Schema;
pub use sections::{SectionKind, Sections};
pub use types::{Document, Finding, FindingCode, FrontMatter, Severity, Value, ValueKind};

use futures::stream::{self, StreamExt};
use promptlint_core::{AppError, AppResult, LintSettings, SectionKeywords};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Run every check on one document.
///
/// Never fails: structural problems become findings and the remaining
/// checks run on whatever could be recovered.
pub fn check_document(doc: &Document, schema: &Schema, keywords: &SectionKeywords) -> Vec<Finding> {
    let mut findings = Vec::new();

    let parsed = match parse_document(doc) {
        Ok(parsed) => parsed,
        Err(e) => {
            let ParseError::UnterminatedFrontMatter { line } = e;
            findings.push(Finding::error(
                FindingCode::UnterminatedFrontMatter,
                &doc.id,
                Some(line),
                e.to_string(),
            ));
            ParsedDocument::without_front_matter(doc)
        }
    };

    findings.extend(parsed.findings.iter().cloned());
    findings.extend(schema.validate_front_matter(&parsed.front_matter, &doc.id));

    let sections = Sections::classify(&parsed.body, parsed.body_start_line, keywords);
    findings.extend(placeholder::check(&doc.id, &sections));
    findings.extend(hygiene::check(&doc.id, &sections));

    tracing::debug!("{}: {} finding(s)", doc.id, findings.len());
    findings
}

/// Check in-memory documents sequentially.
pub fn check_documents(docs: &[Document], schema: &Schema, keywords: &SectionKeywords) -> Report {
    Report::from_results(
        docs.iter()
            .map(|doc| (doc.id.clone(), check_document(doc, schema, keywords))),
    )
}

/// Read and check every file in `paths` with up to `settings.jobs` documents
/// in flight. Identifiers are relative to `root`.
///
/// A file that cannot be read is reported as an `unreadable-document` finding.
pub async fn check_corpus(
    paths: Vec<PathBuf>,
    root: &Path,
    schema: Arc<Schema>,
    settings: &LintSettings,
) -> AppResult<Report> {
    tracing::info!(
        "Checking {} document(s) with {} job(s)",
        paths.len(),
        settings.jobs
    );

    let keywords = Arc::new(settings.sections.clone());
    let root = root.to_path_buf();

    let tasks = paths.into_iter().map(|path| {
        let schema = Arc::clone(&schema);
        let keywords = Arc::clone(&keywords);
        let root = root.clone();
        tokio::task::spawn_blocking(move || check_path(&path, &root, &schema, &keywords))
    });

    let results: Vec<_> = stream::iter(tasks)
        .buffer_unordered(settings.jobs.max(1))
        .collect()
        .await;

    let mut entries = Vec::with_capacity(results.len());
    for result in results {
        let entry = result.map_err(|e| AppError::Lint(format!("Validation task failed: {}", e)))?;
        entries.push(entry);
    }

    Ok(Report::from_results(entries))
}

fn check_path(
    path: &Path,
    root: &Path,
    schema: &Schema,
    keywords: &SectionKeywords,
) -> (String, Vec<Finding>) {
    match load_document(path, root) {
        Ok(doc) => {
            let findings = check_document(&doc, schema, keywords);
            (doc.id, findings)
        }
        Err(e) => {
            let id = document_id(path, root);
            tracing::warn!("Failed to read {:?}: {}", path, e);
            let finding = Finding::error(
                FindingCode::UnreadableDocument,
                &id,
                None,
                format!("failed to read document: {}", e),
            );
            (id, vec![finding])
        }
    }
}
