//! Conformance report aggregation and rendering.
//!
//! The report is a pure function of its input set: documents are ordered by
//! identifier, findings by severity then location, and exact duplicates are
//! dropped, so completion order of parallel validation never shows.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use crate::types::{Finding, Severity};

/// Overall outcome of a run. Only error findings fail it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }

    pub fn passed(&self) -> bool {
        *self == Self::Pass
    }
}

/// Findings of one document, sorted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentReport {
    pub document: String,
    pub findings: Vec<Finding>,
}

impl DocumentReport {
    pub fn errors(&self) -> usize {
        self.findings.iter().filter(|f| f.is_error()).count()
    }

    pub fn warnings(&self) -> usize {
        self.findings.len() - self.errors()
    }
}

/// Aggregated result of a validation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub verdict: Verdict,
    pub documents_checked: usize,
    pub errors: usize,
    pub warnings: usize,

    /// Finding count per code, across the corpus
    pub summary: BTreeMap<String, usize>,

    pub documents: Vec<DocumentReport>,
}

impl Report {
    /// Aggregate per-document results.
    ///
    /// Every document appears in the report, clean ones with no findings.
    /// Results for the same identifier are merged.
    pub fn from_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<Finding>)>,
    {
        let mut by_document: BTreeMap<String, BTreeSet<Finding>> = BTreeMap::new();
        for (document, findings) in results {
            by_document.entry(document).or_default().extend(findings);
        }

        let documents: Vec<DocumentReport> = by_document
            .into_iter()
            .map(|(document, findings)| {
                let mut findings: Vec<Finding> = findings.into_iter().collect();
                findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
                DocumentReport {
                    document,
                    findings,
                }
            })
            .collect();

        let mut summary = BTreeMap::new();
        let mut errors = 0;
        let mut warnings = 0;
        for finding in documents.iter().flat_map(|d| &d.findings) {
            *summary.entry(finding.code.as_str().to_string()).or_insert(0) += 1;
            match finding.severity {
                Severity::Error => errors += 1,
                Severity::Warning => warnings += 1,
            }
        }

        let verdict = if errors > 0 { Verdict::Fail } else { Verdict::Pass };

        Self {
            verdict,
            documents_checked: documents.len(),
            errors,
            warnings,
            summary,
            documents,
        }
    }

    pub fn all_findings(&self) -> impl Iterator<Item = &Finding> {
        self.documents.iter().flat_map(|d| d.findings.iter())
    }

    /// Plain-text rendering for terminals and CI logs.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        for doc in &self.documents {
            if doc.findings.is_empty() {
                let _ = writeln!(out, "{}: ok", doc.document);
                continue;
            }
            let _ = writeln!(
                out,
                "{}: {} error(s), {} warning(s)",
                doc.document,
                doc.errors(),
                doc.warnings()
            );
            for f in &doc.findings {
                let location = f.line.map(|l| format!("line {}", l)).unwrap_or_else(|| "-".to_string());
                let _ = writeln!(
                    out,
                    "  {:<7} {:<8} {:<26} {}",
                    f.severity.as_str(),
                    location,
                    f.code.as_str(),
                    f.message
                );
            }
        }

        if !self.summary.is_empty() {
            out.push_str("\nSummary:\n");
            for (code, count) in &self.summary {
                let _ = writeln!(out, "  {:<26} {}", code, count);
            }
        }

        let _ = writeln!(
            out,
            "\n{} document(s) checked: {} error(s), {} warning(s). Verdict: {}",
            self.documents_checked,
            self.errors,
            self.warnings,
            self.verdict.as_str().to_uppercase()
        );

        out
    }

    /// Machine-readable rendering.
    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FindingCode;

    fn sample() -> Vec<(String, Vec<Finding>)> {
        vec![
            (
                "b.md".to_string(),
                vec![
                    Finding::warning(FindingCode::UnknownField, "b.md", Some(2), "unknown"),
                    Finding::error(FindingCode::TypeMismatch, "b.md", Some(5), "mismatch"),
                    Finding::error(FindingCode::MissingRequiredField, "b.md", None, "missing"),
                ],
            ),
            ("a.md".to_string(), vec![]),
            (
                "c.md".to_string(),
                vec![Finding::warning(FindingCode::UnusedVariable, "c.md", Some(9), "unused")],
            ),
        ]
    }

    #[test]
    fn test_ordering() {
        let report = Report::from_results(sample());
        let docs: Vec<&str> = report.documents.iter().map(|d| d.document.as_str()).collect();
        assert_eq!(docs, vec!["a.md", "b.md", "c.md"]);

        let codes: Vec<FindingCode> = report.documents[1].findings.iter().map(|f| f.code).collect();
        assert_eq!(
            codes,
            vec![
                FindingCode::MissingRequiredField,
                FindingCode::TypeMismatch,
                FindingCode::UnknownField
            ]
        );
    }

    #[test]
    fn test_summary_and_verdict() {
        let report = Report::from_results(sample());
        assert_eq!(report.verdict, Verdict::Fail);
        assert_eq!(report.errors, 2);
        assert_eq!(report.warnings, 2);
        assert_eq!(report.summary["type-mismatch"], 1);
        assert_eq!(report.summary.len(), 4);
    }

    #[test]
    fn test_warnings_never_fail() {
        let report = Report::from_results(vec![(
            "a.md".to_string(),
            vec![Finding::warning(FindingCode::UnknownField, "a.md", Some(1), "x")],
        )]);
        assert_eq!(report.verdict, Verdict::Pass);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut reversed = sample();
        reversed.reverse();
        for (_, findings) in reversed.iter_mut() {
            findings.reverse();
        }
        let a = Report::from_results(sample());
        let b = Report::from_results(reversed);
        assert_eq!(a, b);
        assert_eq!(a.render_text(), b.render_text());
        assert_eq!(a.render_json().unwrap(), b.render_json().unwrap());
    }

    #[test]
    fn test_duplicates_are_merged() {
        let f = Finding::error(FindingCode::OutOfRange, "a.md", Some(3), "x");
        let report = Report::from_results(vec![
            ("a.md".to_string(), vec![f.clone(), f.clone()]),
            ("a.md".to_string(), vec![f]),
        ]);
        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.documents[0].findings.len(), 1);
    }

    #[test]
    fn test_render_text() {
        let text = Report::from_results(sample()).render_text();
        assert!(text.contains("a.md: ok"));
        assert!(text.contains("b.md: 2 error(s), 1 warning(s)"));
        assert!(text.contains("type-mismatch"));
        assert!(text.trim_end().ends_with("Verdict: FAIL"));
    }

    #[test]
    fn test_render_json() {
        let json: serde_json::Value =
            serde_json::from_str(&Report::from_results(sample()).render_json().unwrap()).unwrap();
        assert_eq!(json["verdict"], "fail");
        assert_eq!(json["documents"].as_array().unwrap().len(), 3);
        assert_eq!(json["documents"][1]["findings"][0]["code"], "missing-required-field");
    }
}
