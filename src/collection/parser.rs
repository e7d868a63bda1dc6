//! Markdown collection parser.
//!
//! A collection document is a flat list of sections:
//!
//! ```text
//! # Title (ignored)
//!
//! ### Writing
//! - **角色/类别**: Editor
//! **提示词**: Fix grammar.
//! - **角色/类别**: Summarizer
//! **提示词**: Summarize in 3 bullets.
//! ```
//!
//! Each `### ` heading names a category. Inside a section every role marker
//! opens an entry: the rest of that line is the role, and everything up to the
//! next entry (minus the prompt label) is the prompt. Markers only count at the
//! start of a line.
//!
//! Parsing never fails. Input that does not match the expected shape yields
//! fewer entries plus [`ParseWarning`]s describing what was skipped.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::MarkerSet;

/// One prompt from the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ParsedPromptEntry {
    pub category: String,
    pub role: String,
    pub prompt: String,
}

/// Entries of a document plus anything that was skipped along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct ParseReport {
    pub entries: Vec<ParsedPromptEntry>,
    pub warnings: Vec<ParseWarning>,
}

impl ParseReport {
    /// Only keep entries of `category` (exact match).
    pub fn retain_category(&mut self, category: &str) {
        self.entries.retain(|e| e.category == category);
    }
}

/// Why an entry was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    EmptyRole,
    EmptyPrompt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarning {
    /// The document is blank.
    EmptyDocument,
    /// The document has text but no section heading.
    NoSections,
    /// A section without any entry marker.
    EmptySection { category: String },
    /// An entry with a blank role or prompt. `position` is 1-based within
    /// its section.
    DroppedEntry {
        category: String,
        position: usize,
        reason: DropReason,
    },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::EmptyDocument => write!(f, "document is empty"),
            ParseWarning::NoSections => write!(f, "document has no section headings"),
            ParseWarning::EmptySection { category } => {
                write!(f, "section '{category}' has no entries")
            }
            ParseWarning::DroppedEntry {
                category,
                position,
                reason,
            } => {
                let what = match reason {
                    DropReason::EmptyRole => "empty role",
                    DropReason::EmptyPrompt => "empty prompt",
                };
                write!(f, "entry {position} in section '{category}' dropped: {what}")
            }
        }
    }
}

/// Parse a collection document.
pub fn parse_document(source: &str, markers: &MarkerSet) -> ParseReport {
    let text = source.replace("\r\n", "\n");
    let mut report = ParseReport::default();

    if text.trim().is_empty() {
        report.warnings.push(ParseWarning::EmptyDocument);
        return report;
    }

    // The first fragment is whatever precedes the first heading.
    let sections = split_at_markers(&text, &markers.heading);
    if sections.len() < 2 {
        report.warnings.push(ParseWarning::NoSections);
        return report;
    }

    for section in &sections[1..] {
        let (heading, body) = split_first_line(section);
        let category = heading.trim();

        let fragments = split_at_markers(body, &markers.role);
        if fragments.len() < 2 {
            report.warnings.push(ParseWarning::EmptySection {
                category: category.to_string(),
            });
            continue;
        }

        for (idx, fragment) in fragments[1..].iter().enumerate() {
            let (role_line, rest) = split_first_line(fragment);
            let role = role_line.trim();
            let prompt = rest.replace(&markers.prompt, "");
            let prompt = prompt.trim();

            let reason = if role.is_empty() {
                Some(DropReason::EmptyRole)
            } else if prompt.is_empty() {
                Some(DropReason::EmptyPrompt)
            } else {
                None
            };

            match reason {
                Some(reason) => report.warnings.push(ParseWarning::DroppedEntry {
                    category: category.to_string(),
                    position: idx + 1,
                    reason,
                }),
                None => report.entries.push(ParsedPromptEntry {
                    category: category.to_string(),
                    role: role.to_string(),
                    prompt: prompt.to_string(),
                }),
            }
        }
    }

    report
}

/// Split `text` at every line that starts with `marker`, dropping the marker.
///
/// The first fragment is the text before the first marker line (possibly
/// empty), so a text without markers yields a single fragment.
fn split_at_markers<'a>(text: &'a str, marker: &str) -> Vec<&'a str> {
    let mut fragments = Vec::new();
    let mut fragment_start = 0;
    let mut line_start = 0;

    for line in text.split_inclusive('\n') {
        if line.starts_with(marker) {
            fragments.push(&text[fragment_start..line_start]);
            fragment_start = line_start + marker.len();
        }
        line_start += line.len();
    }
    fragments.push(&text[fragment_start..]);

    fragments
}

/// `(first line, remainder)`, the newline itself belonging to neither.
fn split_first_line(text: &str) -> (&str, &str) {
    text.split_once('\n').unwrap_or((text, ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Language;

    fn zh() -> MarkerSet {
        MarkerSet::for_language(Language::Zh)
    }

    fn entry(category: &str, role: &str, prompt: &str) -> ParsedPromptEntry {
        ParsedPromptEntry {
            category: category.to_string(),
            role: role.to_string(),
            prompt: prompt.to_string(),
        }
    }

    const WRITING: &str = "### Writing
- **角色/类别**: Editor
**提示词**: Fix grammar.
- **角色/类别**: Summarizer
**提示词**: Summarize in 3 bullets.
";

    #[test]
    fn test_parses_entries_in_order() {
        let report = parse_document(WRITING, &zh());

        assert_eq!(
            report.entries,
            vec![
                entry("Writing", "Editor", "Fix grammar."),
                entry("Writing", "Summarizer", "Summarize in 3 bullets."),
            ]
        );
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_preamble_is_ignored() {
        let doc = format!("# ChatGPT 提示词大全\n\n一些介绍文字。\n\n{WRITING}");
        let report = parse_document(&doc, &zh());
        assert_eq!(report.entries.len(), 2);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_entry_count_across_sections() {
        let doc = "### A
- **角色/类别**: a1
**提示词**: one
- **角色/类别**: a2
**提示词**: two
### B
- **角色/类别**: b1
**提示词**: three
### C
- **角色/类别**: c1
**提示词**: four
- **角色/类别**: c2
**提示词**: five
- **角色/类别**: c3
**提示词**: six
";
        let report = parse_document(doc, &zh());

        let roles: Vec<_> = report.entries.iter().map(|e| e.role.as_str()).collect();
        assert_eq!(roles, vec!["a1", "a2", "b1", "c1", "c2", "c3"]);
        assert_eq!(report.entries[2].category, "B");
        assert_eq!(report.entries[5].category, "C");
    }

    #[test]
    fn test_empty_role_is_dropped() {
        let doc = "### Writing
- **角色/类别**: Editor
**提示词**: Fix grammar.
- **角色/类别**:
**提示词**: Orphan prompt.
- **角色/类别**: Summarizer
**提示词**: Summarize in 3 bullets.
";
        let report = parse_document(doc, &zh());

        assert_eq!(report.entries.len(), 2);
        assert_eq!(
            report.warnings,
            vec![ParseWarning::DroppedEntry {
                category: "Writing".to_string(),
                position: 2,
                reason: DropReason::EmptyRole,
            }]
        );
    }

    #[test]
    fn test_empty_prompt_is_dropped() {
        let doc = "### Writing
- **角色/类别**: Editor
**提示词**:
";
        let report = parse_document(doc, &zh());

        assert!(report.entries.is_empty());
        assert_eq!(
            report.warnings,
            vec![ParseWarning::DroppedEntry {
                category: "Writing".to_string(),
                position: 1,
                reason: DropReason::EmptyPrompt,
            }]
        );
    }

    #[test]
    fn test_no_headings_yields_no_entries() {
        let doc = "- **角色/类别**: Editor\n**提示词**: Fix grammar.\n";
        let report = parse_document(doc, &zh());

        assert!(report.entries.is_empty());
        assert_eq!(report.warnings, vec![ParseWarning::NoSections]);
    }

    #[test]
    fn test_blank_document() {
        for doc in ["", "   \n\n\t"] {
            let report = parse_document(doc, &zh());
            assert!(report.entries.is_empty());
            assert_eq!(report.warnings, vec![ParseWarning::EmptyDocument]);
        }
    }

    #[test]
    fn test_section_without_entries() {
        let doc = format!("### Empty\nJust some notes.\n{WRITING}");
        let report = parse_document(&doc, &zh());

        assert_eq!(report.entries.len(), 2);
        assert_eq!(
            report.warnings,
            vec![ParseWarning::EmptySection {
                category: "Empty".to_string()
            }]
        );
    }

    #[test]
    fn test_multiline_prompt_is_kept() {
        let doc = "### Code
- **角色/类别**: Reviewer
**提示词**: Review this code.

Point out bugs first,
then style issues.
";
        let report = parse_document(doc, &zh());
        assert_eq!(
            report.entries[0].prompt,
            "Review this code.\n\nPoint out bugs first,\nthen style issues."
        );
    }

    #[test]
    fn test_markers_only_count_at_line_start() {
        let doc = "### Notes
- **角色/类别**: Quoter
**提示词**: Explain why `### ` and `- **角色/类别**:` are markers.
";
        let report = parse_document(doc, &zh());

        assert_eq!(report.entries.len(), 1);
        assert_eq!(
            report.entries[0].prompt,
            "Explain why `### ` and `- **角色/类别**:` are markers."
        );
    }

    #[test]
    fn test_deeper_headings_are_not_sections() {
        let doc = "### Writing
- **角色/类别**: Editor
**提示词**: Fix grammar.
#### Tip
Keep it short.
";
        let report = parse_document(doc, &zh());

        assert_eq!(report.entries.len(), 1);
        assert_eq!(
            report.entries[0].prompt,
            "Fix grammar.\n#### Tip\nKeep it short."
        );
    }

    #[test]
    fn test_crlf_line_endings() {
        let doc = WRITING.replace('\n', "\r\n");
        let report = parse_document(&doc, &zh());
        assert_eq!(report, parse_document(WRITING, &zh()));
    }

    #[test]
    fn test_english_markers() {
        let doc = "### Writing
- **Role/Category**: Editor
**Prompt**: Fix grammar.
";
        let report = parse_document(doc, &MarkerSet::for_language(Language::En));
        assert_eq!(report.entries, vec![entry("Writing", "Editor", "Fix grammar.")]);

        // Chinese markers do not match an English document.
        let report = parse_document(doc, &zh());
        assert!(report.entries.is_empty());
        assert_eq!(
            report.warnings,
            vec![ParseWarning::EmptySection {
                category: "Writing".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_is_idempotent() {
        let first = parse_document(WRITING, &zh());
        let second = parse_document(WRITING, &zh());
        assert_eq!(first, second);
    }

    #[test]
    fn test_retain_category() {
        let doc = format!("{WRITING}### Code\n- **角色/类别**: Reviewer\n**提示词**: Review.\n");
        let mut report = parse_document(&doc, &zh());
        assert_eq!(report.entries.len(), 3);

        report.retain_category("Code");
        assert_eq!(report.entries, vec![entry("Code", "Reviewer", "Review.")]);
    }

    #[test]
    fn test_warning_serialization() {
        let warning = ParseWarning::DroppedEntry {
            category: "Writing".to_string(),
            position: 2,
            reason: DropReason::EmptyRole,
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "dropped_entry",
                "category": "Writing",
                "position": 2,
                "reason": "empty_role"
            })
        );
        assert_eq!(
            warning.to_string(),
            "entry 2 in section 'Writing' dropped: empty role"
        );
    }
}
