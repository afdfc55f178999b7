//! promptlint CLI
//!
//! Main entry point for the promptlint command-line tool.
//! Checks prompt-template documents for front-matter and placeholder conformance.

mod commands;

use clap::{Parser, Subcommand};
use commands::{CheckCommand, RenderCommand, SchemaCommand, VarsCommand};
use promptlint_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;
use std::process::ExitCode;

/// Every document conforms (warnings allowed)
const EXIT_PASS: u8 = 0;
/// At least one error finding
const EXIT_FAIL: u8 = 1;
/// Bad configuration, schema or usage; nothing was checked
const EXIT_FATAL: u8 = 2;

/// promptlint - conformance checker for prompt-template documents
#[derive(Parser, Debug)]
#[command(name = "promptlint")]
#[command(about = "Conformance checker for prompt-template documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "PROMPTLINT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "PROMPTLINT_CONFIG")]
    config: Option<PathBuf>,

    /// Path to a schema file (replaces or extends the built-in schema)
    #[arg(short, long, global = true, env = "PROMPTLINT_SCHEMA")]
    schema: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check documents and print the conformance report
    Check(CheckCommand),

    /// Print the effective schema
    Schema(SchemaCommand),

    /// List template placeholders and declared variables of a document
    Vars(VarsCommand),

    /// Print a document's prompt template with placeholders filled in
    Render(RenderCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::from(EXIT_PASS),
        Ok(false) => ExitCode::from(EXIT_FAIL),
        Err(e) => {
            tracing::error!("Command failed: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// Returns whether the run passed.
async fn run(cli: Cli) -> AppResult<bool> {
    // Workspace and config file decide which config file is read
    let config = AppConfig::load(cli.workspace, cli.config)?;

    // Apply CLI overrides
    let config = config.with_overrides(cli.schema, cli.log_level, cli.verbose, cli.no_color);

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("promptlint starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Schema file: {:?}", config.schema_file);

    // Configuration errors stop the run before any document is read
    config.validate()?;

    let command_name = match &cli.command {
        Commands::Check(_) => "check",
        Commands::Schema(_) => "schema",
        Commands::Vars(_) => "vars",
        Commands::Render(_) => "render",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Check(cmd) => cmd.execute(&config).await,
        Commands::Schema(cmd) => cmd.execute(&config).map(|()| true),
        Commands::Vars(cmd) => cmd.execute(&config).map(|()| true),
        Commands::Render(cmd) => cmd.execute(&config).map(|()| true),
    };

    if result.is_ok() {
        tracing::info!("Command completed");
    }

    result
}
