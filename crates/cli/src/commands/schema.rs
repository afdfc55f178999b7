//! Schema command handler.
//!
//! Prints the schema in effect after config and `--schema` are applied, in
//! the same shape a schema file uses.

use clap::Args;
use promptlint_core::{config::AppConfig, AppResult};
use promptlint_lint::Schema;

/// Print the effective schema
#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output as JSON (default: YAML)
    #[arg(long)]
    pub json: bool,
}

impl SchemaCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing schema command");

        let schema = Schema::load(config.schema_file.as_deref())?;
        let value = schema.to_value();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            print!("{}", serde_yaml::to_string(&value)?);
        }

        Ok(())
    }
}
