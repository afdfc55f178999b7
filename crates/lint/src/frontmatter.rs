//! Front-matter parsing and encoding.
//!
//! A document may open with a block fenced by `---` lines. Inside, each line
//! is a scalar assignment (`key: value`), the start of a list (`key:` followed
//! by indented `- item` lines), an inline list (`key: [a, b]`) or a folded /
//! literal block (`key: >` / `key: |`). Values decode as booleans, numbers or
//! strings; nothing else is inferred.

use thiserror::Error;

use crate::hygiene::{conflict_marker_finding, is_conflict_marker};
use crate::types::{Document, Finding, FindingCode, FrontMatter, Value};

/// Line that opens and closes a front-matter block.
pub const FENCE: &str = "---";

/// Structural failure that leaves a document without usable metadata.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("front matter opened on line {line} is never closed")]
    UnterminatedFrontMatter { line: usize },
}

/// A document split into decoded front matter and body.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub id: String,
    pub front_matter: FrontMatter,

    /// Whether the document opened with a (closed) front-matter block
    pub has_front_matter: bool,

    pub body: String,

    /// 1-based document line on which `body` starts
    pub body_start_line: usize,

    /// Non-fatal problems met while decoding (duplicates, malformed lines)
    pub findings: Vec<Finding>,
}

impl ParsedDocument {
    /// Best-effort view used when the front matter cannot be decoded: no
    /// metadata and the whole text as body.
    pub fn without_front_matter(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            front_matter: FrontMatter::new(),
            has_front_matter: false,
            body: strip_bom(&doc.text).to_string(),
            body_start_line: 1,
            findings: Vec::new(),
        }
    }
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

fn is_fence(line: &str) -> bool {
    line.trim_end() == FENCE
}

/// Split a document into front matter and body and decode the front matter.
pub fn parse_document(doc: &Document) -> Result<ParsedDocument, ParseError> {
    let lines: Vec<&str> = strip_bom(&doc.text).lines().collect();

    if !lines.first().map(|l| is_fence(l)).unwrap_or(false) {
        return Ok(ParsedDocument::without_front_matter(doc));
    }

    let close = lines
        .iter()
        .skip(1)
        .position(|l| is_fence(l))
        .map(|i| i + 1)
        .ok_or(ParseError::UnterminatedFrontMatter { line: 1 })?;

    let mut findings = Vec::new();
    let front_matter = decode_block(&doc.id, &lines[1..close], 2, &mut findings);

    tracing::trace!(
        "Decoded {} front-matter fields from {}",
        front_matter.len(),
        doc.id
    );

    Ok(ParsedDocument {
        id: doc.id.clone(),
        front_matter,
        has_front_matter: true,
        body: lines[close + 1..].join("\n"),
        body_start_line: close + 2,
        findings,
    })
}

/// What the decoder is collecting after a `key:` line.
enum Pending {
    None,
    List {
        name: String,
        line: usize,
        items: Vec<String>,
    },
    Block {
        name: String,
        line: usize,
        folded: bool,
        parts: Vec<String>,
    },
}

/// Decode the lines between the fences. `first_line` is the document line
/// number of `lines[0]`.
fn decode_block(
    doc_id: &str,
    lines: &[&str],
    first_line: usize,
    findings: &mut Vec<Finding>,
) -> FrontMatter {
    let mut fm = FrontMatter::new();
    let mut pending = Pending::None;
    let mut in_conflict = false;

    for (offset, raw) in lines.iter().enumerate() {
        let line_no = first_line + offset;
        let trimmed = raw.trim();
        let indented = raw.starts_with(' ') || raw.starts_with('\t');

        if let Pending::Block { parts, .. } = &mut pending {
            if indented || trimmed.is_empty() {
                parts.push(trimmed.to_string());
                continue;
            }
        }

        if is_conflict_marker(raw, &mut in_conflict) {
            findings.push(conflict_marker_finding(doc_id, line_no, raw));
            continue;
        }

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(item) = list_item(trimmed) {
            match &mut pending {
                Pending::List { items, .. } => items.push(unquote(item).to_string()),
                _ => findings.push(Finding::warning(
                    FindingCode::MalformedDocument,
                    doc_id,
                    Some(line_no),
                    format!("list item '{}' does not belong to any field", item),
                )),
            }
            continue;
        }

        flush(doc_id, std::mem::replace(&mut pending, Pending::None), &mut fm, findings);

        let Some((key, value)) = split_assignment(raw) else {
            findings.push(Finding::warning(
                FindingCode::MalformedDocument,
                doc_id,
                Some(line_no),
                format!("front-matter line is not 'key: value': {}", trimmed),
            ));
            continue;
        };

        match value {
            "" => {
                pending = Pending::List {
                    name: key.to_string(),
                    line: line_no,
                    items: Vec::new(),
                }
            }
            ">" | ">-" | "|" | "|-" => {
                pending = Pending::Block {
                    name: key.to_string(),
                    line: line_no,
                    folded: value.starts_with('>'),
                    parts: Vec::new(),
                }
            }
            _ => insert(doc_id, &mut fm, key, decode_value(value), line_no, findings),
        }
    }

    flush(doc_id, pending, &mut fm, findings);
    fm
}

fn flush(doc_id: &str, pending: Pending, fm: &mut FrontMatter, findings: &mut Vec<Finding>) {
    match pending {
        Pending::None => {}
        Pending::List { name, line, items } => {
            insert(doc_id, fm, &name, Value::List(items), line, findings)
        }
        Pending::Block {
            name,
            line,
            folded,
            mut parts,
        } => {
            while parts.last().map(|p| p.is_empty()).unwrap_or(false) {
                parts.pop();
            }
            let text = if folded {
                parts.join(" ")
            } else {
                parts.join("\n")
            };
            insert(doc_id, fm, &name, Value::String(text), line, findings)
        }
    }
}

fn insert(
    doc_id: &str,
    fm: &mut FrontMatter,
    name: &str,
    value: Value,
    line: usize,
    findings: &mut Vec<Finding>,
) {
    if let Some(previous) = fm.insert(name, value, line) {
        findings.push(Finding::warning(
            FindingCode::DuplicateField,
            doc_id,
            Some(line),
            format!(
                "field '{}' is repeated (first set on line {}); the last value wins",
                name, previous.line
            ),
        ));
    }
}

/// `- item` → `item`.
fn list_item(trimmed: &str) -> Option<&str> {
    if trimmed == "-" {
        return Some("");
    }
    trimmed.strip_prefix("- ").map(str::trim)
}

/// Split a top-level `key: value` line. Keys start in column zero and
/// contain no whitespace.
fn split_assignment(raw: &str) -> Option<(&str, &str)> {
    if raw.starts_with(char::is_whitespace) {
        return None;
    }
    let (key, value) = raw.split_once(':')?;
    let key = unquote(key.trim_end());
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((key, value.trim()))
}

/// Whether text is a numeric literal: digits with at most one decimal point.
pub fn is_numeric_literal(text: &str) -> bool {
    !text.is_empty()
        && text.chars().any(|c| c.is_ascii_digit())
        && text.chars().all(|c| c.is_ascii_digit() || c == '.')
        && text.matches('.').count() <= 1
}

/// Strip one pair of matching outer quotes.
fn unquote(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

fn is_quoted(text: &str) -> bool {
    unquote(text).len() != text.len()
}

/// Decode a scalar (or inline list) value.
pub fn decode_value(raw: &str) -> Value {
    let raw = raw.trim();

    if is_quoted(raw) {
        return Value::String(unquote(raw).to_string());
    }

    match raw {
        "true" => return Value::Boolean(true),
        "false" => return Value::Boolean(false),
        _ => {}
    }

    if is_numeric_literal(raw) {
        if let Ok(n) = raw.parse::<f64>() {
            return Value::Number(n);
        }
    }

    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        return Value::List(split_flow_list(inner));
    }

    Value::String(raw.to_string())
}

/// Split the inside of `[a, "b, c", d]` on commas outside quotes.
fn split_flow_list(inner: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in inner.chars() {
        match (quote, ch) {
            (None, '"' | '\'') => {
                quote = Some(ch);
                current.push(ch);
            }
            (Some(q), c) if c == q => {
                quote = None;
                current.push(ch);
            }
            (None, ',') => {
                items.push(unquote(current.trim()).to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if !current.trim().is_empty() || !items.is_empty() {
        items.push(unquote(current.trim()).to_string());
    }

    items
}

/// Whether a string must be quoted to decode back as the same string.
fn needs_quotes(text: &str, in_list: bool) -> bool {
    text.is_empty()
        || text.trim() != text
        || text.starts_with(['"', '\'', '#'])
        || (!in_list
            && (text == "true"
                || text == "false"
                || is_numeric_literal(text)
                || text.starts_with('[')
                || matches!(text, ">" | ">-" | "|" | "|-")))
}

fn encode_string(text: &str, in_list: bool) -> String {
    if !needs_quotes(text, in_list) {
        text.to_string()
    } else if !text.contains('"') {
        format!("\"{}\"", text)
    } else {
        format!("'{}'", text)
    }
}

impl FrontMatter {
    /// Render this mapping as a fenced front-matter block.
    ///
    /// Values drawn from the primitive set decode back to an equal mapping.
    /// Multi-line strings are written as `|` blocks.
    pub fn encode(&self) -> String {
        let mut out = String::from(FENCE);
        out.push('\n');

        for entry in self.iter() {
            match &entry.value {
                Value::Boolean(b) => out.push_str(&format!("{}: {}\n", entry.name, b)),
                Value::Number(n) => out.push_str(&format!("{}: {}\n", entry.name, n)),
                Value::String(s) if s.contains('\n') => {
                    out.push_str(&format!("{}: |\n", entry.name));
                    for line in s.lines() {
                        if line.is_empty() {
                            out.push('\n');
                        } else {
                            out.push_str(&format!("  {}\n", line));
                        }
                    }
                }
                Value::String(s) => {
                    out.push_str(&format!("{}: {}\n", entry.name, encode_string(s, false)))
                }
                Value::List(items) if items.is_empty() => {
                    out.push_str(&format!("{}: []\n", entry.name))
                }
                Value::List(items) => {
                    out.push_str(&format!("{}:\n", entry.name));
                    for item in items {
                        out.push_str(&format!("  - {}\n", encode_string(item, true)));
                    }
                }
            }
        }

        out.push_str(FENCE);
        out.push('\n');
        out
    }
}
