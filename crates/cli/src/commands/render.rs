//! Render command handler.

use clap::Args;
use promptlint_core::{config::AppConfig, AppError, AppResult};
use promptlint_lint::{render_template, Sections};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::read_parsed;

/// Print a document's prompt template with placeholders filled in
#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Document whose template to render
    pub file: PathBuf,

    /// Placeholder value as NAME=VALUE (repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", s)),
    }
}

impl RenderCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing render command for {:?}", self.file);

        let parsed = read_parsed(&self.file, &config.workspace)?;
        let sections = Sections::classify(&parsed.body, parsed.body_start_line, &config.lint.sections);

        let values: BTreeMap<String, String> = self.vars.iter().cloned().collect();
        let rendered = render_template(&sections, &values)
            .map_err(|e| AppError::Lint(format!("{}: {}", parsed.id, e)))?;

        println!("{}", rendered);
        Ok(())
    }
}
