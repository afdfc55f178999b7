//! Lint type definitions.
//!
//! This module defines the domain entities shared by every check: documents,
//! decoded front matter and findings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unit of content identified by a path-like name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Identifier used in reports (workspace-relative path)
    pub id: String,

    /// Raw document text
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Primitive kinds a front-matter value can decode to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    List,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::List => "list",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded front-matter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Number(f64),
    String(String),
    List(Vec<String>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::List(_) => ValueKind::List,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "\"{}\"", s),
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// One decoded `key: value` entry and the line it was read from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldEntry {
    pub name: String,
    pub value: Value,
    pub line: usize,
}

/// Ordered mapping from field name to decoded value.
///
/// Field names are unique: inserting an existing name replaces the value in
/// place and keeps the original position.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct FrontMatter {
    entries: Vec<FieldEntry>,
}

impl FrontMatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, returning the entry it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: Value, line: usize) -> Option<FieldEntry> {
        let entry = FieldEntry {
            name: name.into(),
            value,
            line,
        };

        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => Some(std::mem::replace(existing, entry)),
            None => {
                self.entries.push(entry);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Two mappings are equal when they hold the same names and values in the
/// same order; source lines are ignored.
impl PartialEq for FrontMatter {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| a.name == b.name && a.value == b.value)
    }
}

/// Finding severity. Errors sort before warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable machine-readable finding codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingCode {
    // Front matter structure
    UnterminatedFrontMatter,
    DuplicateField,
    MalformedDocument,

    // Schema
    MissingRequiredField,
    UnknownField,
    TypeMismatch,
    InvalidEnumValue,
    OutOfRange,
    InvalidFormat,

    // Placeholders
    UndeclaredPlaceholder,
    UnusedVariable,
    DuplicateVariable,

    // Document hygiene
    DuplicateSection,
    MissingTemplateSection,
    UnreadableDocument,
}

impl FindingCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnterminatedFrontMatter => "unterminated-front-matter",
            Self::DuplicateField => "duplicate-field",
            Self::MalformedDocument => "malformed-document",
            Self::MissingRequiredField => "missing-required-field",
            Self::UnknownField => "unknown-field",
            Self::TypeMismatch => "type-mismatch",
            Self::InvalidEnumValue => "invalid-enum-value",
            Self::OutOfRange => "out-of-range",
            Self::InvalidFormat => "invalid-format",
            Self::UndeclaredPlaceholder => "undeclared-placeholder",
            Self::UnusedVariable => "unused-variable",
            Self::DuplicateVariable => "duplicate-variable",
            Self::DuplicateSection => "duplicate-section",
            Self::MissingTemplateSection => "missing-template-section",
            Self::UnreadableDocument => "unreadable-document",
        }
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validation result.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub code: FindingCode,

    /// Document identifier
    pub document: String,

    /// 1-based line in the document, when the finding has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    pub message: String,
}

impl Finding {
    pub fn error(
        code: FindingCode,
        document: &str,
        line: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Error, code, document, line, message)
    }

    pub fn warning(
        code: FindingCode,
        document: &str,
        line: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, code, document, line, message)
    }

    fn new(
        severity: Severity,
        code: FindingCode,
        document: &str,
        line: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            document: document.to_string(),
            line,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Ordering key: severity, then location (document-level first), then
    /// code and message so that ties are still deterministic.
    pub fn sort_key(&self) -> (Severity, &str, Option<usize>, &'static str, &str) {
        (
            self.severity,
            &self.document,
            self.line,
            self.code.as_str(),
            &self.message,
        )
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(
                f,
                "{}:{}: {}[{}] {}",
                self.document, line, self.severity, self.code, self.message
            ),
            None => write!(
                f,
                "{}: {}[{}] {}",
                self.document, self.severity, self.code, self.message
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut fm = FrontMatter::new();
        fm.insert("title", Value::String("a".to_string()), 2);
        fm.insert("version", Value::String("1".to_string()), 3);
        let previous = fm.insert("title", Value::String("b".to_string()), 4);

        assert_eq!(previous.unwrap().line, 2);
        assert_eq!(fm.len(), 2);
        let names: Vec<&str> = fm.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["title", "version"]);
        assert_eq!(fm.get("title").unwrap().value, Value::String("b".to_string()));
        assert_eq!(fm.get("title").unwrap().line, 4);
    }

    #[test]
    fn test_equality_ignores_lines() {
        let mut a = FrontMatter::new();
        a.insert("score", Value::Number(7.5), 2);
        let mut b = FrontMatter::new();
        b.insert("score", Value::Number(7.5), 9);
        assert_eq!(a, b);
    }

    #[test]
    fn test_finding_serialization() {
        let finding = Finding::error(
            FindingCode::OutOfRange,
            "cot.md",
            Some(4),
            "effectivenessScore 11 is outside [0, 10]",
        );
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["severity"], "error");
        assert_eq!(json["code"], "out-of-range");
        assert_eq!(json["line"], 4);

        let document_level = Finding::warning(FindingCode::UnknownField, "cot.md", None, "x");
        let json = serde_json::to_value(&document_level).unwrap();
        assert!(json.get("line").is_none());
    }

    #[test]
    fn test_errors_sort_before_warnings() {
        let warning = Finding::warning(FindingCode::UnknownField, "a.md", Some(1), "w");
        let error = Finding::error(FindingCode::TypeMismatch, "a.md", Some(9), "e");
        assert!(error.sort_key() < warning.sort_key());
    }

    #[test]
    fn test_code_strings_match_serde() {
        for code in [
            FindingCode::MissingRequiredField,
            FindingCode::UndeclaredPlaceholder,
            FindingCode::UnterminatedFrontMatter,
        ] {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, code.as_str());
        }
    }
}
