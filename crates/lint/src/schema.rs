//! Front-matter schema: rule definitions, loading and validation.
//!
//! A schema maps field names to rules. It is open: fields the schema does
//! not know are reported as warnings, never errors, so the schema can grow
//! without breaking existing documents.
//!
//! Schema files are YAML:
//!
//! ```yaml
//! extends: default        # optional: merge over the built-in rules
//! fields:
//!   difficulty:
//!     kind: string
//!     required: true
//!     enum: [beginner, intermediate, advanced]
//!   effectivenessScore:
//!     kind: number
//!     range: { min: 0, max: 10 }
//!     aliases: [effectiveness_score]
//! ```

use chrono::{DateTime, NaiveDate};
use promptlint_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::frontmatter::is_numeric_literal;
use crate::types::{FieldEntry, Finding, FindingCode, FrontMatter, Value, ValueKind};

/// Inclusive numeric bounds. Either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NumericRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl NumericRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn contains(&self, n: f64) -> bool {
        self.min.map(|min| n >= min).unwrap_or(true) && self.max.map(|max| n <= max).unwrap_or(true)
    }

    fn describe(&self) -> String {
        let fmt = |b: Option<f64>| b.map(|v| v.to_string()).unwrap_or_else(|| "..".to_string());
        format!("[{}, {}]", fmt(self.min), fmt(self.max))
    }
}

/// Shape constraints for string values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StringFormat {
    /// `YYYY-MM-DD`, or a full RFC 3339 timestamp
    IsoDate,
}

impl StringFormat {
    fn accepts(&self, text: &str) -> bool {
        match self {
            Self::IsoDate => {
                NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
                    || DateTime::parse_from_rfc3339(text).is_ok()
            }
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::IsoDate => "ISO date (YYYY-MM-DD)",
        }
    }
}

/// Rule for one front-matter field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaRule {
    pub kind: ValueKind,

    #[serde(default)]
    pub required: bool,

    /// Enumerated legal values (string fields)
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,

    /// Element sub-schema (list fields)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<ElementRule>,

    /// Inclusive bounds (number fields)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<NumericRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<StringFormat>,

    /// Alternative spellings accepted for this field
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

/// Rule applied to every element of a list field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementRule {
    #[serde(default = "default_element_kind")]
    pub kind: ValueKind,

    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<NumericRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<StringFormat>,
}

fn default_element_kind() -> ValueKind {
    ValueKind::String
}

/// Borrowed view of the constraints shared by field and element rules.
#[derive(Clone, Copy)]
struct Constraint<'a> {
    kind: ValueKind,
    values: Option<&'a [String]>,
    range: Option<NumericRange>,
    format: Option<StringFormat>,
}

impl SchemaRule {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            required: false,
            values: None,
            items: None,
            range: None,
            format: None,
            aliases: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn items(mut self, items: ElementRule) -> Self {
        self.items = Some(items);
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.range = Some(NumericRange::new(min, max));
        self
    }

    pub fn format(mut self, format: StringFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    fn constraint(&self) -> Constraint<'_> {
        Constraint {
            kind: self.kind,
            values: self.values.as_deref(),
            range: self.range,
            format: self.format,
        }
    }
}

impl ElementRule {
    pub fn strings() -> Self {
        Self {
            kind: ValueKind::String,
            values: None,
            range: None,
            format: None,
        }
    }

    fn constraint(&self) -> Constraint<'_> {
        Constraint {
            kind: self.kind,
            values: self.values.as_deref(),
            range: self.range,
            format: self.format,
        }
    }
}

/// On-disk schema file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaFile {
    #[serde(default)]
    extends: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, SchemaRule>,
}

/// A validated, immutable rule set.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: BTreeMap<String, SchemaRule>,
}

impl Schema {
    /// Build a schema, rejecting rules that cannot be enforced.
    pub fn new(fields: BTreeMap<String, SchemaRule>) -> AppResult<Self> {
        let schema = Self { fields };
        schema.check_rules()?;
        Ok(schema)
    }

    /// The built-in rule set for prompt-template documents.
    pub fn builtin() -> Self {
        let strings = ElementRule::strings;
        let fields: BTreeMap<String, SchemaRule> = [
            ("title", SchemaRule::new(ValueKind::String)),
            (
                "difficulty",
                SchemaRule::new(ValueKind::String)
                    .required()
                    .one_of(&["beginner", "intermediate", "advanced"]),
            ),
            ("audience", SchemaRule::new(ValueKind::List).required().items(strings())),
            ("platforms", SchemaRule::new(ValueKind::List).required().items(strings())),
            ("topics", SchemaRule::new(ValueKind::List).required().items(strings())),
            ("version", SchemaRule::new(ValueKind::String).required()),
            (
                "date",
                SchemaRule::new(ValueKind::String)
                    .required()
                    .format(StringFormat::IsoDate),
            ),
            ("governance_tags", SchemaRule::new(ValueKind::List).items(strings())),
            (
                "dataClassification",
                SchemaRule::new(ValueKind::String).one_of(&["public", "internal", "confidential"]),
            ),
            (
                "reviewStatus",
                SchemaRule::new(ValueKind::String).one_of(&["draft", "approved"]),
            ),
            (
                "effectivenessScore",
                SchemaRule::new(ValueKind::Number)
                    .range(0.0, 10.0)
                    .alias("effectiveness_score"),
            ),
        ]
        .into_iter()
        .map(|(name, rule)| (name.to_string(), rule))
        .collect();

        Self { fields }
    }

    /// Load a schema file. With `extends: default` its fields are merged over
    /// the built-in rules; otherwise they replace them.
    pub fn from_yaml(contents: &str) -> AppResult<Self> {
        let file: SchemaFile = serde_yaml::from_str(contents)
            .map_err(|e| AppError::Schema(format!("invalid schema definition: {}", e)))?;

        let mut fields = match file.extends.as_deref() {
            None => BTreeMap::new(),
            Some("default") => Self::builtin().fields,
            Some(other) => {
                return Err(AppError::Schema(format!(
                    "unknown base schema '{}' (only 'default' is available)",
                    other
                )))
            }
        };
        fields.extend(file.fields);

        Self::new(fields)
    }

    /// Load the schema named in the configuration, or the built-in one.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let Some(path) = path else {
            tracing::debug!("Using built-in schema");
            return Ok(Self::builtin());
        };

        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Schema(format!("failed to read schema file {:?}: {}", path, e))
        })?;
        let schema = Self::from_yaml(&contents)
            .map_err(|e| AppError::Schema(format!("{:?}: {}", path, strip_prefix(&e))))?;

        tracing::info!("Loaded schema from {:?} ({} fields)", path, schema.len());
        Ok(schema)
    }

    pub fn get(&self, name: &str) -> Option<&SchemaRule> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &SchemaRule)> {
        self.fields.iter()
    }

    /// Whether `name` is a field or an alias of one.
    pub fn knows(&self, name: &str) -> bool {
        self.fields.contains_key(name)
            || self
                .fields
                .values()
                .any(|rule| rule.aliases.iter().any(|a| a == name))
    }

    /// Serializable view, in the same shape as a schema file.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({ "fields": self.fields })
    }

    fn check_rules(&self) -> AppResult<()> {
        let mut seen_aliases: BTreeMap<&str, &str> = BTreeMap::new();

        for (name, rule) in &self.fields {
            if name.trim().is_empty() || name.contains(char::is_whitespace) {
                return Err(AppError::Schema(format!("invalid field name '{}'", name)));
            }

            check_constraint(name, rule.constraint())?;

            match (&rule.items, rule.kind) {
                (Some(items), ValueKind::List) => {
                    if items.kind == ValueKind::List {
                        return Err(AppError::Schema(format!(
                            "field '{}': list elements cannot themselves be lists",
                            name
                        )));
                    }
                    check_constraint(&format!("{}[]", name), items.constraint())?;
                }
                (Some(_), kind) => {
                    return Err(AppError::Schema(format!(
                        "field '{}': 'items' only applies to list fields, not {}",
                        name, kind
                    )))
                }
                (None, _) => {}
            }

            for alias in &rule.aliases {
                if self.fields.contains_key(alias) {
                    return Err(AppError::Schema(format!(
                        "alias '{}' of field '{}' is itself a field",
                        alias, name
                    )));
                }
                if let Some(owner) = seen_aliases.insert(alias, name) {
                    return Err(AppError::Schema(format!(
                        "alias '{}' is claimed by both '{}' and '{}'",
                        alias, owner, name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Check decoded front matter against every rule.
    pub fn validate_front_matter(&self, fm: &FrontMatter, doc_id: &str) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (name, rule) in &self.fields {
            let mut present: Vec<&FieldEntry> = std::iter::once(name)
                .chain(rule.aliases.iter())
                .filter_map(|n| fm.get(n))
                .collect();
            present.sort_by_key(|e| e.line);

            let Some(entry) = present.last() else {
                if rule.required {
                    findings.push(Finding::error(
                        FindingCode::MissingRequiredField,
                        doc_id,
                        None,
                        format!("required field '{}' is missing", name),
                    ));
                }
                continue;
            };

            for shadowed in &present[..present.len() - 1] {
                findings.push(Finding::warning(
                    FindingCode::DuplicateField,
                    doc_id,
                    Some(shadowed.line),
                    format!(
                        "'{}' and '{}' both set field '{}'; the value on line {} wins",
                        shadowed.name, entry.name, name, entry.line
                    ),
                ));
            }

            self.check_entry(entry, rule, doc_id, &mut findings);
        }

        for entry in fm.iter() {
            if !self.knows(&entry.name) {
                findings.push(Finding::warning(
                    FindingCode::UnknownField,
                    doc_id,
                    Some(entry.line),
                    format!("field '{}' is not in the schema", entry.name),
                ));
            }
        }

        findings
    }

    fn check_entry(&self, entry: &FieldEntry, rule: &SchemaRule, doc_id: &str, out: &mut Vec<Finding>) {
        let line = Some(entry.line);

        if entry.value.kind() != rule.kind {
            out.push(Finding::error(
                FindingCode::TypeMismatch,
                doc_id,
                line,
                format!(
                    "field '{}' must be a {}, found {} {}",
                    entry.name,
                    rule.kind,
                    entry.value.kind(),
                    entry.value
                ),
            ));
            return;
        }

        match (&entry.value, &rule.items) {
            (Value::List(items), Some(element)) => {
                let constraint = element.constraint();
                for (i, item) in items.iter().enumerate() {
                    let label = format!("{}[{}]", entry.name, i);
                    match coerce_element(item, constraint.kind) {
                        Some(value) => check_constraint_value(&label, &value, constraint, doc_id, line, out),
                        None => out.push(Finding::error(
                            FindingCode::TypeMismatch,
                            doc_id,
                            line,
                            format!("element {} must be a {}, found \"{}\"", label, constraint.kind, item),
                        )),
                    }
                }
            }
            (Value::List(_), None) => {}
            (value, _) => check_constraint_value(&entry.name, value, rule.constraint(), doc_id, line, out),
        }
    }
}

/// Drop the "Schema error: " display prefix when re-wrapping.
fn strip_prefix(err: &AppError) -> String {
    match err {
        AppError::Schema(msg) => msg.clone(),
        other => other.to_string(),
    }
}

fn check_constraint(name: &str, c: Constraint<'_>) -> AppResult<()> {
    if let Some(values) = c.values {
        if c.kind != ValueKind::String {
            return Err(AppError::Schema(format!(
                "field '{}': 'enum' only applies to strings, not {}",
                name, c.kind
            )));
        }
        if values.is_empty() {
            return Err(AppError::Schema(format!(
                "field '{}': 'enum' must list at least one value",
                name
            )));
        }
    }

    if let Some(range) = c.range {
        if c.kind != ValueKind::Number {
            return Err(AppError::Schema(format!(
                "field '{}': 'range' only applies to numbers, not {}",
                name, c.kind
            )));
        }
        let bounds = [range.min, range.max];
        if bounds.iter().flatten().any(|b| !b.is_finite()) {
            return Err(AppError::Schema(format!(
                "field '{}': range bounds must be finite",
                name
            )));
        }
        if let (Some(min), Some(max)) = (range.min, range.max) {
            if min > max {
                return Err(AppError::Schema(format!(
                    "field '{}': range min {} exceeds max {}",
                    name, min, max
                )));
            }
        }
    }

    if c.format.is_some() && c.kind != ValueKind::String {
        return Err(AppError::Schema(format!(
            "field '{}': 'format' only applies to strings, not {}",
            name, c.kind
        )));
    }

    Ok(())
}

/// Interpret a list element (always text) as the element kind.
fn coerce_element(item: &str, kind: ValueKind) -> Option<Value> {
    match kind {
        ValueKind::String => Some(Value::String(item.to_string())),
        ValueKind::Number if is_numeric_literal(item) => item.parse().ok().map(Value::Number),
        ValueKind::Boolean => match item {
            "true" => Some(Value::Boolean(true)),
            "false" => Some(Value::Boolean(false)),
            _ => None,
        },
        _ => None,
    }
}

fn check_constraint_value(
    label: &str,
    value: &Value,
    c: Constraint<'_>,
    doc_id: &str,
    line: Option<usize>,
    out: &mut Vec<Finding>,
) {
    match value {
        Value::String(s) => {
            if let Some(values) = c.values {
                if !values.iter().any(|v| v == s) {
                    out.push(Finding::error(
                        FindingCode::InvalidEnumValue,
                        doc_id,
                        line,
                        format!("'{}' has value \"{}\"; expected one of: {}", label, s, values.join(", ")),
                    ));
                }
            }
            if let Some(format) = c.format {
                if !format.accepts(s) {
                    out.push(Finding::error(
                        FindingCode::InvalidFormat,
                        doc_id,
                        line,
                        format!("'{}' has value \"{}\"; expected {}", label, s, format.as_str()),
                    ));
                }
            }
        }
        Value::Number(n) => {
            if let Some(range) = c.range {
                if !range.contains(*n) {
                    out.push(Finding::error(
                        FindingCode::OutOfRange,
                        doc_id,
                        line,
                        format!("'{}' is {}, outside the allowed range {}", label, n, range.describe()),
                    ));
                }
            }
        }
        Value::Boolean(_) | Value::List(_) => {}
    }
}
