//! Vars command handler.

use clap::Args;
use promptlint_core::{config::AppConfig, AppResult};
use promptlint_lint::placeholder::{cross_reference, extract_placeholders, extract_variables};
use promptlint_lint::Sections;
use std::path::PathBuf;

use super::read_parsed;

/// List a document's template placeholders and declared variables
#[derive(Args, Debug)]
pub struct VarsCommand {
    /// Document to inspect
    pub file: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl VarsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing vars command for {:?}", self.file);

        let parsed = read_parsed(&self.file, &config.workspace)?;
        let sections = Sections::classify(&parsed.body, parsed.body_start_line, &config.lint.sections);

        let placeholders = extract_placeholders(&sections);
        let variables = extract_variables(&sections);
        let findings = cross_reference(&parsed.id, &placeholders, &variables);

        if self.json {
            let output = serde_json::json!({
                "document": parsed.id,
                "placeholders": placeholders,
                "variables": variables,
                "findings": findings,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("{}", parsed.id);

        if placeholders.is_empty() {
            println!("Placeholders: (none)");
        } else {
            println!("Placeholders:");
            for p in &placeholders {
                println!("  {:<24} line {}, column {}", p.literal, p.line, p.column);
            }
        }

        if variables.is_empty() {
            println!("Variables: (none)");
        } else {
            println!("Variables:");
            for v in &variables {
                println!("  {:<24} {}", v.name, v.description);
            }
        }

        for finding in &findings {
            println!("{}", finding);
        }

        Ok(())
    }
}
