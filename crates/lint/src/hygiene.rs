//! Document hygiene: editorial leftovers the checker surfaces but never repairs.

use std::collections::BTreeMap;

use crate::sections::{SectionKind, Sections};
use crate::types::{Finding, FindingCode};

/// Report conflict markers, repeated sections and a variables section that
/// has no template to describe.
pub fn check(doc_id: &str, sections: &Sections<'_>) -> Vec<Finding> {
    let mut findings = conflict_markers(doc_id, sections);
    findings.extend(duplicate_sections(doc_id, sections));

    if sections.has(SectionKind::Variables) && !sections.has(SectionKind::Template) {
        findings.push(Finding::warning(
            FindingCode::MissingTemplateSection,
            doc_id,
            None,
            "document declares variables but has no prompt template section",
        ));
    }

    findings
}

/// Whether `text` is a merge-conflict marker line. `open` tracks whether a
/// `<<<<<<<` has been seen; a bare `=======` only counts after one, since it
/// is also a setext heading underline.
pub(crate) fn is_conflict_marker(text: &str, open: &mut bool) -> bool {
    let text = text.trim_end();
    if text.starts_with("<<<<<<<") {
        *open = true;
        true
    } else if text.starts_with(">>>>>>>") {
        *open = false;
        true
    } else {
        *open && text == "======="
    }
}

pub(crate) fn conflict_marker_finding(doc_id: &str, line: usize, text: &str) -> Finding {
    Finding::error(
        FindingCode::MalformedDocument,
        doc_id,
        Some(line),
        format!("leftover merge-conflict marker: {}", text.trim_end()),
    )
}

/// Conflict markers at line start, outside fences.
fn conflict_markers(doc_id: &str, sections: &Sections<'_>) -> Vec<Finding> {
    let mut open = false;
    sections
        .lines()
        .iter()
        .filter(|l| !l.in_fence && is_conflict_marker(l.text, &mut open))
        .map(|l| conflict_marker_finding(doc_id, l.number, l.text))
        .collect()
}

/// The same heading text at the same level more than once.
fn duplicate_sections(doc_id: &str, sections: &Sections<'_>) -> Vec<Finding> {
    let mut seen: BTreeMap<(usize, String), usize> = BTreeMap::new();
    let mut findings = Vec::new();

    for heading in sections.headings() {
        let key = (heading.level, heading.text.to_lowercase());
        match seen.get(&key) {
            Some(first) => findings.push(Finding::warning(
                FindingCode::DuplicateSection,
                doc_id,
                Some(heading.line),
                format!(
                    "section '{}' repeats the heading on line {}",
                    heading.text, first
                ),
            )),
            None => {
                seen.insert(key, heading.line);
            }
        }
    }

    findings
}
