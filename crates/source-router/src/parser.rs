/// Parser for house guidance notes.
///
/// A note is a markdown file with an optional leading metadata block:
///
/// ```text
/// ---
/// title: Xylitol toxicity
/// tags: [toxicity, emergency]
/// keywords: ["xylitol", "sugar-free gum"]
/// ---
/// Body text...
/// ```
///
/// Recognized keys are `title`, `tags` and `keywords`; anything else is
/// ignored. A field that cannot be read falls back to its default and is
/// reported as a [`MetadataWarning`]; parsing itself never fails.
use std::path::Path;

use regex::Regex;

use crate::model::GuidanceNote;

const MARKER: &str = "---";

/// A recoverable problem in a note's metadata block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataWarning {
    #[error("metadata block opened on line 1 but never closed; treating file as body")]
    Unterminated,

    #[error("'{key}' on line {line} is not a bracketed list; using an empty list")]
    UnbracketedList { key: String, line: usize },

    #[error("empty title on line {line}; using the file name")]
    EmptyTitle { line: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedNote {
    pub note: GuidanceNote,
    pub warnings: Vec<MetadataWarning>,
}

/// Parse one note. `file_name` becomes the note id and, without a title, its
/// stem becomes the title.
pub fn parse_note(file_name: &str, raw: &str) -> ParsedNote {
    let content = raw.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    let default_title = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.to_string());

    let mut note = GuidanceNote {
        id: file_name.to_string(),
        title: default_title,
        tags: Vec::new(),
        keywords: Vec::new(),
        body: content.trim().to_string(),
    };
    let mut warnings = Vec::new();

    let Some((meta, body)) = split_metadata(&content) else {
        if first_line(&content) == MARKER {
            warnings.push(MetadataWarning::Unterminated);
        }
        return ParsedNote { note, warnings };
    };

    note.body = body.trim().to_string();
    apply_metadata(&mut note, meta, &mut warnings);
    ParsedNote { note, warnings }
}

fn first_line(content: &str) -> &str {
    content.lines().next().unwrap_or("").trim_end()
}

/// Splits `---\n<meta>\n---\n<body>`. Returns `None` without a closed block.
fn split_metadata(content: &str) -> Option<(&str, &str)> {
    if first_line(content) != MARKER {
        return None;
    }
    let after_open = content.find('\n')? + 1;

    let mut offset = after_open;
    for line in content[after_open..].split_inclusive('\n') {
        if line.trim_end() == MARKER {
            let meta = &content[after_open..offset];
            let body = &content[offset + line.len()..];
            return Some((meta, body));
        }
        offset += line.len();
    }
    None
}

fn apply_metadata(note: &mut GuidanceNote, meta: &str, warnings: &mut Vec<MetadataWarning>) {
    let key_value_re = Regex::new(r"^\s*([A-Za-z_]+)\s*:\s*(.*?)\s*$").expect("valid regex");
    let list_re = Regex::new(r"^\[(.*)\]$").expect("valid regex");

    let mut seen_title = false;
    let mut seen_tags = false;
    let mut seen_keywords = false;

    for (i, line) in meta.lines().enumerate() {
        // Line 1 is the opening marker.
        let line_number = i + 2;
        let Some(caps) = key_value_re.captures(line) else {
            continue;
        };
        let key = caps[1].to_ascii_lowercase();
        let value = &caps[2];

        match key.as_str() {
            "title" if !seen_title => {
                seen_title = true;
                let title = unquote(value);
                if title.is_empty() {
                    warnings.push(MetadataWarning::EmptyTitle { line: line_number });
                } else {
                    note.title = title.to_string();
                }
            }
            "tags" | "keywords" => {
                let seen = if key == "tags" {
                    &mut seen_tags
                } else {
                    &mut seen_keywords
                };
                if *seen {
                    continue;
                }
                *seen = true;

                let Some(list) = list_re.captures(value) else {
                    warnings.push(MetadataWarning::UnbracketedList {
                        key: key.clone(),
                        line: line_number,
                    });
                    continue;
                };
                let items = parse_list(&list[1]);
                if key == "tags" {
                    note.tags = items;
                } else {
                    note.keywords = items;
                }
            }
            _ => {}
        }
    }
}

/// Comma-separated items, unquoted, empties and repeats dropped.
fn parse_list(inner: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in inner.split(',').map(unquote).filter(|s| !s.is_empty()) {
        if !items.iter().any(|existing| existing == item) {
            items.push(item.to_string());
        }
    }
    items
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = s
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_metadata() {
        let raw = r#"---
title: Xylitol toxicity
tags: [toxicity, "emergency"]
keywords: ['xylitol', "sugar-free gum", xylitol]
---

Xylitol causes a rapid insulin release in dogs.
"#;
        let parsed = parse_note("xylitol.md", raw);
        assert!(parsed.warnings.is_empty());
        let note = parsed.note;
        assert_eq!(note.id, "xylitol.md");
        assert_eq!(note.title, "Xylitol toxicity");
        assert_eq!(note.tags, vec!["toxicity", "emergency"]);
        assert_eq!(note.keywords, vec!["xylitol", "sugar-free gum"]);
        assert_eq!(note.body, "Xylitol causes a rapid insulin release in dogs.");
    }

    #[test]
    fn no_metadata_uses_file_defaults() {
        let parsed = parse_note("crate-games.md", "\n  Start with short sessions.  \n");
        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.note.title, "crate-games");
        assert!(parsed.note.tags.is_empty());
        assert!(parsed.note.keywords.is_empty());
        assert_eq!(parsed.note.body, "Start with short sessions.");
    }

    #[test]
    fn marker_later_in_document_is_not_metadata() {
        let raw = "Intro line\n---\ntitle: nope\n---\nrest";
        let parsed = parse_note("intro.md", raw);
        assert_eq!(parsed.note.title, "intro");
        assert_eq!(parsed.note.body, raw);
    }

    #[test]
    fn unterminated_block_is_body() {
        let raw = "---\ntitle: Half open\nbody without a closing marker";
        let parsed = parse_note("half.md", raw);
        assert_eq!(parsed.warnings, vec![MetadataWarning::Unterminated]);
        assert_eq!(parsed.note.title, "half");
        assert_eq!(parsed.note.body, raw);
    }

    #[test]
    fn partial_metadata_degrades_per_field() {
        let raw = "---\ntitle:\ntags: toxicity, emergency\nkeywords: [grapes]\n---\nBody";
        let parsed = parse_note("grapes.md", raw);
        assert_eq!(
            parsed.warnings,
            vec![
                MetadataWarning::EmptyTitle { line: 2 },
                MetadataWarning::UnbracketedList {
                    key: "tags".to_string(),
                    line: 3
                },
            ]
        );
        assert_eq!(parsed.note.title, "grapes");
        assert!(parsed.note.tags.is_empty());
        assert_eq!(parsed.note.keywords, vec!["grapes"]);
        assert_eq!(parsed.note.body, "Body");
    }

    #[test]
    fn crlf_and_unknown_keys() {
        let raw = "---\r\nauthor: someone\r\ntitle: \"Recall basics\"\r\nhashtags: [x]\r\ntags: []\r\n---\r\nCall once.\r\n";
        let parsed = parse_note("recall.md", raw);
        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.note.title, "Recall basics");
        assert!(parsed.note.tags.is_empty());
        assert_eq!(parsed.note.body, "Call once.");
    }

    #[test]
    fn empty_metadata_block() {
        let parsed = parse_note("empty.md", "---\n---\nJust body");
        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.note.title, "empty");
        assert_eq!(parsed.note.body, "Just body");
    }

    #[test]
    fn first_key_wins() {
        let raw = "---\ntitle: One\ntitle: Two\ntags: [a]\ntags: [b]\n---\n";
        let parsed = parse_note("dup.md", raw);
        assert_eq!(parsed.note.title, "One");
        assert_eq!(parsed.note.tags, vec!["a"]);
        assert_eq!(parsed.note.body, "");
    }
}
