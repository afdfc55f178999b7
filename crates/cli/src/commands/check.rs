//! Check command handler.
//!
//! Validates a corpus and prints the conformance report.

use clap::Args;
use promptlint_core::{config::AppConfig, AppError, AppResult};
use promptlint_lint::{check_corpus, discover_documents, Schema};
use std::path::PathBuf;
use std::sync::Arc;

/// Check documents against the schema and placeholder rules
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Files or directories to check (default: the workspace)
    pub paths: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Maximum number of documents checked concurrently
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

impl CheckCommand {
    /// Returns whether the verdict is pass.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<bool> {
        tracing::info!("Executing check command");

        let mut settings = config.lint.clone();
        if let Some(jobs) = self.jobs {
            settings.jobs = jobs;
        }
        settings.validate()?;

        let schema = Arc::new(Schema::load(config.schema_file.as_deref())?);

        let paths = if self.paths.is_empty() {
            vec![config.workspace.clone()]
        } else {
            self.paths.clone()
        };

        let documents = discover_documents(&paths, &settings)?;
        if documents.is_empty() {
            tracing::warn!("No documents found under {:?}", paths);
        }

        let report = check_corpus(documents, &config.workspace, schema, &settings).await?;

        tracing::debug!(
            "Report: {} documents, {} errors, {} warnings",
            report.documents_checked,
            report.errors,
            report.warnings
        );
        for finding in report.all_findings() {
            tracing::trace!("{}", finding);
        }

        if self.json {
            let output = report
                .render_json()
                .map_err(|e| AppError::Serialization(format!("JSON serialization failed: {}", e)))?;
            println!("{}", output);
        } else {
            print!("{}", report.render_text());
        }

        Ok(report.verdict.passed())
    }
}
