//! Configuration management for promptlint.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Config files (.promptlint/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources override earlier ones. The configuration is workspace-centric:
//! document identifiers in reports are relative to the workspace root.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .promptlint/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Optional schema file replacing or extending the built-in schema
    pub schema_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Document discovery and section detection settings
    pub lint: LintSettings,
}

/// Settings that drive discovery and section classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LintSettings {
    /// File extensions (without the dot) treated as documents
    pub extensions: Vec<String>,

    /// Directory names never descended into
    pub exclude_dirs: Vec<String>,

    /// Maximum number of documents validated concurrently
    pub jobs: usize,

    /// Heading keywords used to classify body sections
    pub sections: SectionKeywords,
}

/// Heading keywords for each section class.
///
/// Keywords are compared case-insensitively as whole words. A heading is a
/// variables or examples section when a keyword appears anywhere in it; it is
/// a template section only when it consists of a template keyword (leading
/// numbering and a trailing `(...)` aside) or ends with a multi-word one.
/// Classes are tried in the order variables, examples, template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionKeywords {
    /// Headings introducing the literal prompt text
    pub template: Vec<String>,

    /// Headings introducing example inputs/outputs (never scanned)
    pub examples: Vec<String>,

    /// Headings introducing the variable declarations
    pub variables: Vec<String>,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    schema: Option<String>,
    logging: Option<LoggingConfig>,
    lint: Option<LintSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for SectionKeywords {
    fn default() -> Self {
        Self {
            template: words(&["prompt template", "template", "prompt"]),
            examples: words(&[
                "example",
                "examples",
                "output",
                "outputs",
                "sample",
                "samples",
                "transcript",
            ]),
            variables: words(&["variables", "variable", "placeholders"]),
        }
    }
}

impl Default for LintSettings {
    fn default() -> Self {
        Self {
            extensions: words(&["md", "markdown"]),
            exclude_dirs: words(&[".git", ".promptlint", "target", "node_modules"]),
            jobs: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            sections: SectionKeywords::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            schema_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            lint: LintSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file, environment and defaults.
    ///
    /// `workspace` and `config_file` come from the command line when given;
    /// they are needed up front because they decide which config file is read.
    ///
    /// Environment variables:
    /// - `PROMPTLINT_WORKSPACE`: Override workspace path
    /// - `PROMPTLINT_CONFIG`: Path to config file
    /// - `PROMPTLINT_SCHEMA`: Path to schema file
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use promptlint_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None, None).expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| env_path("PROMPTLINT_WORKSPACE")) {
            config.workspace = workspace;
        }

        config.config_file = config_file.or_else(|| env_path("PROMPTLINT_CONFIG"));

        config = config.load_file()?;

        // Environment variables override YAML config
        if let Some(schema) = env_path("PROMPTLINT_SCHEMA") {
            config.schema_file = Some(schema);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge the config file (explicit, or `.promptlint/config.yaml`) if present.
    ///
    /// An explicitly named config file must exist; the workspace default is
    /// optional.
    pub fn load_file(self) -> AppResult<Self> {
        let (config_path, explicit) = match self.config_file {
            Some(ref cf) => (cf.clone(), true),
            None => (self.promptlint_dir().join("config.yaml"), false),
        };

        if config_path.exists() {
            self.merge_yaml(&config_path)
        } else if explicit {
            Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )))
        } else {
            Ok(self)
        }
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = if contents.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(&contents).map_err(|e| {
                AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        };

        tracing::debug!("Merging config file {:?}", path);

        let mut result = self.clone();

        // Relative paths resolve against the current workspace
        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = result.workspace.join(path);
            }
        }

        if let Some(schema) = config_file.schema {
            result.schema_file = Some(result.workspace.join(schema));
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(lint) = config_file.lint {
            result.lint = lint;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and
    /// the config file.
    pub fn with_overrides(
        mut self,
        schema_file: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(schema_file) = schema_file {
            self.schema_file = Some(schema_file);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .promptlint directory.
    pub fn promptlint_dir(&self) -> PathBuf {
        self.workspace.join(".promptlint")
    }

    /// Validate the final configuration before any document is touched.
    pub fn validate(&self) -> AppResult<()> {
        if !self.workspace.is_dir() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                self.workspace
            )));
        }

        if let Some(ref schema) = self.schema_file {
            if !schema.is_file() {
                return Err(AppError::Config(format!(
                    "Schema file not found: {:?}",
                    schema
                )));
            }
        }

        self.lint.validate()
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name).ok().map(PathBuf::from)
}

impl LintSettings {
    /// Reject settings that would make every run meaningless.
    pub fn validate(&self) -> AppResult<()> {
        if self.jobs == 0 {
            return Err(AppError::Config("lint.jobs must be at least 1".to_string()));
        }

        if self.extensions.is_empty() {
            return Err(AppError::Config(
                "lint.extensions must list at least one extension".to_string(),
            ));
        }

        let sections = [
            ("template", &self.sections.template),
            ("examples", &self.sections.examples),
            ("variables", &self.sections.variables),
        ];
        for (name, keywords) in sections {
            if keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(AppError::Config(format!(
                    "lint.sections.{} needs at least one keyword",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Whether a path has one of the configured document extensions.
    pub fn is_document(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(!config.verbose);
        assert!(!config.no_color);
        assert!(config.schema_file.is_none());
        assert!(config.lint.jobs >= 1);
        assert!(config.lint.extensions.contains(&"md".to_string()));
    }

    #[test]
    fn test_promptlint_dir() {
        let config = AppConfig::default();
        assert!(config.promptlint_dir().ends_with(".promptlint"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            Some(PathBuf::from("schema.yaml")),
            None,
            true,
            false,
        );

        assert_eq!(overridden.schema_file, Some(PathBuf::from("schema.yaml")));
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_partial_lint_settings() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".promptlint");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("config.yaml"),
            "schema: schema.yaml\nlogging:\n  color: false\nlint:\n  jobs: 2\n  sections:\n    template: [\"prompt body\"]\n",
        )
        .unwrap();

        let config = AppConfig {
            workspace: temp.path().to_path_buf(),
            ..AppConfig::default()
        }
        .load_file()
        .unwrap();

        assert_eq!(config.lint.jobs, 2);
        assert_eq!(config.lint.sections.template, vec!["prompt body".to_string()]);
        // Unspecified keys keep their defaults
        assert_eq!(config.lint.sections.examples, SectionKeywords::default().examples);
        assert_eq!(config.lint.extensions, LintSettings::default().extensions);
        assert_eq!(config.schema_file, Some(temp.path().join("schema.yaml")));
        assert!(config.no_color);
    }

    #[test]
    fn test_missing_explicit_config_file_is_an_error() {
        let config = AppConfig {
            config_file: Some(PathBuf::from("/definitely/not/here.yaml")),
            ..AppConfig::default()
        };
        assert!(config.load_file().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_jobs() {
        let mut settings = LintSettings::default();
        settings.jobs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_keywords() {
        let mut settings = LintSettings::default();
        settings.sections.variables = vec![" ".to_string()];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_is_document() {
        let settings = LintSettings::default();
        assert!(settings.is_document(Path::new("docs/react.md")));
        assert!(settings.is_document(Path::new("docs/COT.MD")));
        assert!(!settings.is_document(Path::new("docs/notes.txt")));
        assert!(!settings.is_document(Path::new("README")));
    }
}
