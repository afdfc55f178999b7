//! Placeholder extraction and variable cross-referencing.
//!
//! Template placeholders are bracketed tokens (`[TASK]`) in the prompt
//! template section. Declared variables come from the variables section,
//! written either as a Markdown table (name in the first cell) or as a list
//! (name as the leading token of each top-level item). Every placeholder
//! must be declared exactly once and every declaration must be used.

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use crate::sections::{BodyLine, SectionKind, Sections};
use crate::types::{Finding, FindingCode};

/// A bracketed token in the prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placeholder {
    /// Text between the brackets; the match key for declarations
    pub name: String,

    /// Token as written, brackets included
    pub literal: String,

    pub line: usize,

    /// 1-based character column of the opening bracket
    pub column: usize,
}

/// One entry of the variables section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableDeclaration {
    pub name: String,
    pub description: String,
    pub line: usize,
}

/// `[` + one or more non-`]` characters + `]`, on one line.
pub fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[([^\]\n]+)\]").expect("placeholder pattern is valid"))
}

/// Whether a pattern match ending at byte `end` of `text` is a placeholder
/// rather than a link, footnote or checkbox.
pub(crate) fn is_placeholder_token(text: &str, end: usize, name: &str) -> bool {
    !(text[end..].starts_with('(') || name.starts_with('^') || name.trim().is_empty())
}

/// Find placeholders on one line. Markdown links (`[text](url)`),
/// footnote references (`[^1]`) and blank checkboxes (`[ ]`) are skipped.
pub fn scan_line(text: &str, line: usize) -> Vec<Placeholder> {
    placeholder_pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?.as_str();

            if !is_placeholder_token(text, whole.end(), name) {
                return None;
            }

            Some(Placeholder {
                name: name.to_string(),
                literal: whole.as_str().to_string(),
                line,
                column: text[..whole.start()].chars().count() + 1,
            })
        })
        .collect()
}

/// All placeholders in the template section, in document order.
pub fn extract_placeholders(sections: &Sections<'_>) -> Vec<Placeholder> {
    sections
        .content(SectionKind::Template)
        .flat_map(|l| scan_line(l.text, l.number))
        .collect()
}

fn is_table_row(text: &str) -> bool {
    text.trim_start().starts_with('|')
}

fn is_separator_row(text: &str) -> bool {
    let t = text.trim();
    t.starts_with('|')
        && t.contains('-')
        && t.chars().all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}

fn table_cells(text: &str) -> Vec<&str> {
    let t = text.trim();
    let t = t.strip_prefix('|').unwrap_or(t);
    let t = t.strip_suffix('|').unwrap_or(t);
    t.split('|').map(str::trim).collect()
}

/// Strip emphasis, code ticks and brackets around a declared name.
fn normalize_name(raw: &str) -> &str {
    let mut name = raw.trim();
    loop {
        let before = name;
        for (open, close) in [("**", "**"), ("__", "__"), ("`", "`"), ("[", "]"), ("*", "*"), ("_", "_")] {
            if name.len() > open.len() + close.len() && name.starts_with(open) && name.ends_with(close) {
                name = name[open.len()..name.len() - close.len()].trim();
            }
        }
        if name == before {
            return name;
        }
    }
}

/// Top-level list item text: `- x`, `* x`, `+ x` or `1. x`.
fn list_item(text: &str) -> Option<&str> {
    let indent = text.len() - text.trim_start().len();
    if indent > 1 {
        return None;
    }
    let t = text.trim_start();
    if let Some(rest) = t.strip_prefix("- ").or_else(|| t.strip_prefix("* ")).or_else(|| t.strip_prefix("+ ")) {
        return Some(rest.trim());
    }
    let digits = t.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = t[digits..].strip_prefix(". ").or_else(|| t[digits..].strip_prefix(") ")) {
            return Some(rest.trim());
        }
    }
    None
}

/// Split a list item into (name, description).
fn split_list_item(item: &str) -> (&str, &str) {
    // Wrapped names may contain spaces: [DESCRIBE YOUR TASK], `TASK`, **TASK**
    for (open, close) in [("**", "**"), ("`", "`"), ("[", "]")] {
        if let Some(rest) = item.strip_prefix(open) {
            if let Some(end) = rest.find(close) {
                let split = open.len() + end + close.len();
                return (&item[..split], trim_separator(&item[split..]));
            }
        }
    }

    let end = item
        .find(|c: char| c == ':' || c.is_whitespace())
        .unwrap_or(item.len());
    (&item[..end], trim_separator(&item[end..]))
}

fn trim_separator(rest: &str) -> &str {
    rest.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '-' | '–' | '—' | '='))
        .trim()
}

/// All declarations in the variables section, in document order.
pub fn extract_variables(sections: &Sections<'_>) -> Vec<VariableDeclaration> {
    let lines: Vec<&BodyLine<'_>> = sections.content(SectionKind::Variables).collect();
    let mut declarations = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let (name, description) = if is_table_row(line.text) {
            let next_is_separator = lines
                .get(i + 1)
                .map(|next| is_separator_row(next.text))
                .unwrap_or(false);
            if is_separator_row(line.text) || next_is_separator {
                continue;
            }
            let cells = table_cells(line.text);
            let name = cells.first().copied().unwrap_or("");
            let description = cells.get(1..).map(|rest| rest.join(" | ")).unwrap_or_default();
            (name, description)
        } else if let Some(item) = list_item(line.text) {
            let (name, description) = split_list_item(item);
            (name, description.to_string())
        } else {
            continue;
        };

        let name = normalize_name(name);
        if name.is_empty() {
            continue;
        }

        declarations.push(VariableDeclaration {
            name: name.to_string(),
            description,
            line: line.number,
        });
    }

    declarations
}

/// Cross-reference placeholders against declarations.
pub fn cross_reference(
    doc_id: &str,
    placeholders: &[Placeholder],
    variables: &[VariableDeclaration],
) -> Vec<Finding> {
    let mut findings = Vec::new();

    let mut declared: BTreeMap<&str, &VariableDeclaration> = BTreeMap::new();
    for var in variables {
        if let Some(first) = declared.get(var.name.as_str()) {
            findings.push(Finding::warning(
                FindingCode::DuplicateVariable,
                doc_id,
                Some(var.line),
                format!(
                    "variable '{}' is declared again (first declared on line {})",
                    var.name, first.line
                ),
            ));
            continue;
        }
        declared.insert(var.name.as_str(), var);
    }

    let mut reported: BTreeSet<&str> = BTreeSet::new();
    for placeholder in placeholders {
        if declared.contains_key(placeholder.name.as_str()) || !reported.insert(placeholder.name.as_str()) {
            continue;
        }
        findings.push(Finding::error(
            FindingCode::UndeclaredPlaceholder,
            doc_id,
            Some(placeholder.line),
            format!(
                "placeholder {} is used in the prompt template but never declared",
                placeholder.literal
            ),
        ));
    }

    let used: BTreeSet<&str> = placeholders.iter().map(|p| p.name.as_str()).collect();
    for var in declared.values() {
        if !used.contains(var.name.as_str()) {
            findings.push(Finding::warning(
                FindingCode::UnusedVariable,
                doc_id,
                Some(var.line),
                format!(
                    "variable '{}' is declared but never used in the prompt template",
                    var.name
                ),
            ));
        }
    }

    findings
}

/// Extract and cross-reference in one step.
pub fn check(doc_id: &str, sections: &Sections<'_>) -> Vec<Finding> {
    let placeholders = extract_placeholders(sections);
    let variables = extract_variables(sections);

    tracing::trace!(
        "{}: {} placeholders, {} declared variables",
        doc_id,
        placeholders.len(),
        variables.len()
    );

    cross_reference(doc_id, &placeholders, &variables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptlint_core::SectionKeywords;

    fn sections(body: &str) -> Sections<'_> {
        Sections::classify(body, 1, &SectionKeywords::default())
    }

    fn names(vars: &[VariableDeclaration]) -> Vec<&str> {
        vars.iter().map(|v| v.name.as_str()).collect()
    }

    #[test]
    fn test_scan_line() {
        let found = scan_line("Use [TASK] and [TASK], see [docs](http://x) [^1] [ ]", 3);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "TASK");
        assert_eq!(found[0].literal, "[TASK]");
        assert_eq!(found[0].column, 5);
        assert_eq!(found[1].line, 3);
    }

    #[test]
    fn test_free_text_placeholder() {
        let found = scan_line("Describe: [describe your task here]", 1);
        assert_eq!(found[0].name, "describe your task here");
    }

    #[test]
    fn test_examples_are_not_scanned() {
        let body = "## Prompt\nSolve [PROBLEM].\n## Example Output\n```\n[ANSWER]\n```\n";
        let found = extract_placeholders(&sections(body));
        let found: Vec<&str> = found.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(found, vec!["PROBLEM"]);
    }

    #[test]
    fn test_list_declarations() {
        let body = concat!(
            "## Variables\n",
            "- [TASK]: what to do\n",
            "- `CONTEXT` - background\n",
            "* **AUDIENCE**: who reads it\n",
            "1. TONE: voice\n",
            "- [DESCRIBE YOUR TASK] the free-text form\n",
            "  - nested detail, not a variable\n",
            "Prose line.\n",
        );
        let vars = extract_variables(&sections(body));
        assert_eq!(
            names(&vars),
            vec!["TASK", "CONTEXT", "AUDIENCE", "TONE", "DESCRIBE YOUR TASK"]
        );
        assert_eq!(vars[0].description, "what to do");
        assert_eq!(vars[1].description, "background");
        assert_eq!(vars[0].line, 2);
    }

    #[test]
    fn test_table_declarations() {
        let body = "## Variables\n\n| Variable | Description |\n|---|---|\n| `[TASK]` | what to do |\n| CONTEXT | background |\n";
        let vars = extract_variables(&sections(body));
        assert_eq!(names(&vars), vec!["TASK", "CONTEXT"]);
        assert_eq!(vars[0].description, "what to do");
        assert_eq!(vars[0].line, 5);
    }

    #[test]
    fn test_cross_reference_mismatch() {
        let body = "## Prompt Template\nDo [DESCRIBE_YOUR_TASK] now. Then [DESCRIBE_YOUR_TASK] again.\n## Variables\n- [TASK]: the task\n";
        let findings = check("b.md", &sections(body));

        assert_eq!(findings.len(), 2);
        let undeclared: Vec<&Finding> = findings
            .iter()
            .filter(|f| f.code == FindingCode::UndeclaredPlaceholder)
            .collect();
        assert_eq!(undeclared.len(), 1);
        assert!(undeclared[0].message.contains("[DESCRIBE_YOUR_TASK]"));
        assert!(undeclared[0].is_error());

        let unused: Vec<&Finding> = findings
            .iter()
            .filter(|f| f.code == FindingCode::UnusedVariable)
            .collect();
        assert_eq!(unused.len(), 1);
        assert!(unused[0].message.contains("'TASK'"));
        assert!(!unused[0].is_error());
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let body = "## Prompt\n[Task]\n## Variables\n- [TASK]: x\n";
        let findings = check("c.md", &sections(body));
        let codes: Vec<FindingCode> = findings.iter().map(|f| f.code).collect();
        assert!(codes.contains(&FindingCode::UndeclaredPlaceholder));
        assert!(codes.contains(&FindingCode::UnusedVariable));
    }

    #[test]
    fn test_duplicate_declaration() {
        let body = "## Prompt\n[TASK]\n## Variables\n- [TASK]: x\n- [TASK]: y\n";
        let findings = check("d.md", &sections(body));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, FindingCode::DuplicateVariable);
        assert_eq!(findings[0].line, Some(5));
    }

    #[test]
    fn test_consistent_document_is_clean() {
        let body = "## Prompt Template\n```\nAnswer [QUESTION] for [AUDIENCE].\n```\n### Variables\n| Name | Meaning |\n| --- | --- |\n| QUESTION | q |\n| AUDIENCE | a |\n";
        assert!(check("e.md", &sections(body)).is_empty());
    }
}
