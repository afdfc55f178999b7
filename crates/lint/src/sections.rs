//! Body section classification.
//!
//! The body is split by Markdown ATX headings into sections. Each heading is
//! classified by keyword (variables, examples, template). Variables and
//! examples keywords may appear anywhere in a heading; a template heading
//! must be the keyword phrase itself. An unclassified heading inherits the
//! class of its enclosing heading. Headings inside
//! fenced code blocks are ordinary text, since prompt templates often carry
//! their own `#` headings inside a fence.

use promptlint_core::SectionKeywords;

/// What a body line is part of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// Prose, governance notes, anything unclassified
    Other,
    /// The literal prompt text
    Template,
    /// Example inputs and outputs; never scanned for placeholders
    Examples,
    /// Variable declarations
    Variables,
}

/// A heading outside any fence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub text: String,
    pub line: usize,
    pub kind: SectionKind,
}

/// One classified body line.
#[derive(Debug, Clone, Copy)]
pub struct BodyLine<'a> {
    /// 1-based document line number
    pub number: usize,
    pub text: &'a str,
    pub kind: SectionKind,

    /// Inside a fenced code block (fence markers excluded)
    pub in_fence: bool,

    /// The line opens or closes a fence
    pub is_fence_marker: bool,

    pub is_heading: bool,
}

/// The classified body of one document.
#[derive(Debug, Clone)]
pub struct Sections<'a> {
    lines: Vec<BodyLine<'a>>,
    headings: Vec<Heading>,
}

/// Compiled keyword lists.
struct Classifier {
    template: Vec<Vec<String>>,
    examples: Vec<Vec<String>>,
    variables: Vec<Vec<String>>,
}

fn words_of(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

impl Classifier {
    fn new(keywords: &SectionKeywords) -> Self {
        let compile = |list: &[String]| -> Vec<Vec<String>> {
            list.iter()
                .map(|k| words_of(k))
                .filter(|w| !w.is_empty())
                .collect()
        };
        Self {
            template: compile(&keywords.template),
            examples: compile(&keywords.examples),
            variables: compile(&keywords.variables),
        }
    }

    fn classify(&self, heading: &str) -> Option<SectionKind> {
        let words = words_of(heading);
        let anywhere = |phrases: &[Vec<String>]| {
            phrases.iter().any(|phrase| {
                words
                    .windows(phrase.len())
                    .any(|window| window == phrase.as_slice())
            })
        };

        if anywhere(&self.variables) {
            Some(SectionKind::Variables)
        } else if anywhere(&self.examples) {
            Some(SectionKind::Examples)
        } else if self.is_template(heading) {
            Some(SectionKind::Template)
        } else {
            None
        }
    }

    /// A template heading is a keyword phrase on its own ("Prompt",
    /// "2. Template (copy this)") or ends with a multi-word phrase
    /// ("Basic Prompt Template"). Prose such as "When to Use This Prompt"
    /// is not.
    fn is_template(&self, heading: &str) -> bool {
        let words: Vec<String> = words_of(strip_parenthetical(heading))
            .into_iter()
            .skip_while(|w| w.chars().all(|c| c.is_ascii_digit()))
            .collect();

        self.template.iter().any(|phrase| {
            words == *phrase || (phrase.len() > 1 && words.ends_with(phrase))
        })
    }
}

/// Drop one trailing `(...)` note from a heading.
fn strip_parenthetical(heading: &str) -> &str {
    let trimmed = heading.trim_end();
    match (trimmed.ends_with(')'), trimmed.rfind('(')) {
        (true, Some(open)) => &trimmed[..open],
        _ => trimmed,
    }
}

/// Open fence: marker character and length.
#[derive(Clone, Copy)]
struct Fence {
    marker: char,
    len: usize,
}

fn fence_marker(line: &str) -> Option<Fence> {
    let trimmed = line.trim_start();
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    (len >= 3).then_some(Fence { marker, len })
}

fn closes(open: Fence, line: &str) -> bool {
    match fence_marker(line) {
        Some(f) => {
            f.marker == open.marker
                && f.len >= open.len
                && line.trim().chars().all(|c| c == open.marker)
        }
        None => false,
    }
}

/// Parse an ATX heading: up to three spaces, 1-6 `#`, then a space or end.
pub fn parse_heading(line: &str) -> Option<(usize, String)> {
    let trimmed = line.trim_start();
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let text = rest.trim().trim_end_matches('#').trim_end();
    Some((level, text.to_string()))
}

impl<'a> Sections<'a> {
    /// Classify `body`, whose first line is document line `first_line`.
    pub fn classify(body: &'a str, first_line: usize, keywords: &SectionKeywords) -> Self {
        let classifier = Classifier::new(keywords);
        let mut lines = Vec::new();
        let mut headings = Vec::new();
        let mut stack: Vec<(usize, SectionKind)> = Vec::new();
        let mut fence: Option<Fence> = None;

        for (offset, text) in body.lines().enumerate() {
            let number = first_line + offset;
            let current = stack.last().map(|(_, k)| *k).unwrap_or(SectionKind::Other);

            if let Some(open) = fence {
                let is_close = closes(open, text);
                if is_close {
                    fence = None;
                }
                lines.push(BodyLine {
                    number,
                    text,
                    kind: current,
                    in_fence: !is_close,
                    is_fence_marker: is_close,
                    is_heading: false,
                });
                continue;
            }

            if let Some(open) = fence_marker(text) {
                fence = Some(open);
                lines.push(BodyLine {
                    number,
                    text,
                    kind: current,
                    in_fence: false,
                    is_fence_marker: true,
                    is_heading: false,
                });
                continue;
            }

            if let Some((level, heading)) = parse_heading(text) {
                while stack.last().map(|(l, _)| *l >= level).unwrap_or(false) {
                    stack.pop();
                }
                let parent = stack.last().map(|(_, k)| *k).unwrap_or(SectionKind::Other);
                let kind = classifier.classify(&heading).unwrap_or(parent);
                stack.push((level, kind));

                headings.push(Heading {
                    level,
                    text: heading,
                    line: number,
                    kind,
                });
                lines.push(BodyLine {
                    number,
                    text,
                    kind,
                    in_fence: false,
                    is_fence_marker: false,
                    is_heading: true,
                });
                continue;
            }

            lines.push(BodyLine {
                number,
                text,
                kind: current,
                in_fence: false,
                is_fence_marker: false,
                is_heading: false,
            });
        }

        Self { lines, headings }
    }

    pub fn lines(&self) -> &[BodyLine<'a>] {
        &self.lines
    }

    pub fn headings(&self) -> &[Heading] {
        &self.headings
    }

    /// Content lines of one section class (headings and fence markers excluded).
    pub fn content(&self, kind: SectionKind) -> impl Iterator<Item = &BodyLine<'a>> {
        self.lines
            .iter()
            .filter(move |l| l.kind == kind && !l.is_heading && !l.is_fence_marker)
    }

    /// Whether some heading introduces a section of this class.
    pub fn has(&self, kind: SectionKind) -> bool {
        self.headings.iter().any(|h| h.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
# Chain of Thought

Intro prose.

## Prompt Template

```text
# Role
Solve [PROBLEM] step by step.
```

### Variables

- [PROBLEM]: the problem statement

## Example Output

```
Step 1: [not a placeholder]
```

## Governance
Notes.";

    fn kinds_of(sections: &Sections<'_>) -> Vec<(String, SectionKind)> {
        sections
            .headings()
            .iter()
            .map(|h| (h.text.clone(), h.kind))
            .collect()
    }

    #[test]
    fn test_heading_classification() {
        let sections = Sections::classify(DOC, 1, &SectionKeywords::default());
        assert_eq!(
            kinds_of(&sections),
            vec![
                ("Chain of Thought".to_string(), SectionKind::Other),
                ("Prompt Template".to_string(), SectionKind::Template),
                ("Variables".to_string(), SectionKind::Variables),
                ("Example Output".to_string(), SectionKind::Examples),
                ("Governance".to_string(), SectionKind::Other),
            ]
        );
    }

    #[test]
    fn test_headings_inside_fences_are_text() {
        let sections = Sections::classify(DOC, 1, &SectionKeywords::default());
        assert!(sections.headings().iter().all(|h| h.text != "Role"));

        let template: Vec<&str> = sections
            .content(SectionKind::Template)
            .map(|l| l.text)
            .filter(|t| !t.is_empty())
            .collect();
        assert_eq!(template, vec!["# Role", "Solve [PROBLEM] step by step."]);
    }

    #[test]
    fn test_line_numbers_are_offset() {
        let sections = Sections::classify("## Prompt\ntext", 7, &SectionKeywords::default());
        assert_eq!(sections.headings()[0].line, 7);
        assert_eq!(sections.content(SectionKind::Template).next().unwrap().number, 8);
    }

    #[test]
    fn test_unclassified_subheading_inherits() {
        let body = "## Prompt Template\n### System message\nYou are [ROLE].";
        let sections = Sections::classify(body, 1, &SectionKeywords::default());
        assert_eq!(sections.headings()[1].kind, SectionKind::Template);
        assert_eq!(sections.content(SectionKind::Template).count(), 1);
    }

    #[test]
    fn test_whole_word_matching() {
        let sections = Sections::classify(
            "## Prompting Tips\ntext\n## Templates Overview\n",
            1,
            &SectionKeywords::default(),
        );
        assert_eq!(sections.headings()[0].kind, SectionKind::Other);
        assert_eq!(sections.headings()[1].kind, SectionKind::Other);
    }

    #[test]
    fn test_prose_mentioning_prompt_is_not_a_template() {
        let body = "## When to Use This Prompt\nGood for audits [see appendix].\n## Prompt Tips\n## About this prompt\n";
        let sections = Sections::classify(body, 1, &SectionKeywords::default());
        assert!(sections.headings().iter().all(|h| h.kind == SectionKind::Other));
        assert!(!sections.has(SectionKind::Template));
    }

    #[test]
    fn test_template_heading_forms() {
        let body = "## Prompt\n## 2. Template (copy this)\n## Basic Prompt Template\n## The Prompt\n";
        let sections = Sections::classify(body, 1, &SectionKeywords::default());
        let kinds: Vec<SectionKind> = sections.headings().iter().map(|h| h.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Template,
                SectionKind::Template,
                SectionKind::Template,
                SectionKind::Other
            ]
        );
    }

    #[test]
    fn test_parse_heading() {
        assert_eq!(parse_heading("## Variables ##"), Some((2, "Variables".to_string())));
        assert_eq!(parse_heading("#hashtag"), None);
        assert_eq!(parse_heading("    # indented code"), None);
        assert_eq!(parse_heading("####### seven"), None);
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let body = "## Prompt\n```\n## Not a heading\n[X]";
        let sections = Sections::classify(body, 1, &SectionKeywords::default());
        assert_eq!(sections.headings().len(), 1);
        assert!(sections.content(SectionKind::Template).all(|l| l.in_fence));
    }
}
