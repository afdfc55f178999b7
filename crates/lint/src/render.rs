//! Placeholder substitution for the prompt template section.

use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::placeholder::{is_placeholder_token, placeholder_pattern};
use crate::sections::{BodyLine, SectionKind, Sections};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("document has no prompt template section")]
    NoTemplate,

    #[error("no value supplied for: {}", .0.join(", "))]
    MissingValues(Vec<String>),
}

/// Template lines to render: content plus subheadings, without the heading
/// that opens each template section and without fence markers.
fn template_lines<'s, 'a>(sections: &'s Sections<'a>) -> impl Iterator<Item = &'s BodyLine<'a>> {
    let lines = sections.lines();
    lines.iter().enumerate().filter_map(move |(i, line)| {
        let opens_section = line.is_heading
            && (i == 0 || lines[i - 1].kind != SectionKind::Template);
        (line.kind == SectionKind::Template && !line.is_fence_marker && !opens_section)
            .then_some(line)
    })
}

/// Return the template text with every `[NAME]` replaced by `values[NAME]`.
///
/// Fence markers and the section heading are dropped so the result is the
/// bare prompt; subheadings inside the section are kept. Markdown
/// links and other tokens the extractor skips are left untouched.
pub fn render_template(
    sections: &Sections<'_>,
    values: &BTreeMap<String, String>,
) -> Result<String, RenderError> {
    if !sections.has(SectionKind::Template) {
        return Err(RenderError::NoTemplate);
    }

    let mut missing = BTreeSet::new();
    let mut rendered = Vec::new();

    for line in template_lines(sections) {
        let text = line.text;
        let out = placeholder_pattern().replace_all(text, |caps: &regex::Captures<'_>| {
            let whole = &caps[0];
            let name = &caps[1];
            let end = caps.get(0).map(|m| m.end()).unwrap_or(0);
            let skipped = !is_placeholder_token(text, end, name);

            match values.get(name) {
                _ if skipped => whole.to_string(),
                Some(value) => value.clone(),
                None => {
                    missing.insert(name.to_string());
                    whole.to_string()
                }
            }
        });
        rendered.push(out.into_owned());
    }

    if !missing.is_empty() {
        return Err(RenderError::MissingValues(missing.into_iter().collect()));
    }

    let start = rendered.iter().position(|l| !l.trim().is_empty());
    let end = rendered.iter().rposition(|l| !l.trim().is_empty());
    Ok(match (start, end) {
        (Some(start), Some(end)) => rendered[start..=end].join("\n"),
        _ => String::new(),
    })
}
