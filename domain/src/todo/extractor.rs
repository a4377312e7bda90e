//! Obligation extraction heuristics.
//!
//! Requirement text is read generously: every enumerated line and every
//! imperative line is an obligation. Generated output is read strictly:
//! only explicit markers count, so ordinary discussion prose never turns
//! into work items.

use super::entities::TodoStatus;

/// Verbs that make a requirement line an obligation.
const IMPERATIVE_PREFIXES: &[&str] = &[
    "must",
    "should",
    "need to",
    "needs to",
    "ensure",
    "make sure",
    "add",
    "implement",
    "support",
    "provide",
    "create",
    "write",
    "remove",
    "fix",
    "update",
    "document",
    "verify",
    "allow",
    "migrate",
];

/// Explicit obligation markers in generated output.
const OUTPUT_MARKERS: &[&str] = &["todo:", "action item:", "next step:", "- [ ]"];

/// Resolution markers in generated output.
const RESOLUTION_MARKERS: &[(&str, TodoStatus)] = &[
    ("- [x]", TodoStatus::Completed),
    ("done:", TodoStatus::Completed),
    ("dropped:", TodoStatus::Dropped),
];

/// A resolution statement found in generated output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub status: TodoStatus,
    pub description: String,
}

/// Obligations stated by requirement text.
pub fn extract_requirements(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            if let Some(item) = strip_enumeration(line) {
                return clean(item);
            }
            if is_imperative(line) {
                return clean(line);
            }
            None
        })
        .collect()
}

/// Obligations explicitly marked in generated output.
pub fn extract_marked(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let line = strip_bullet(line.trim());
            OUTPUT_MARKERS
                .iter()
                .find_map(|marker| strip_prefix_ci(line, marker))
                .and_then(clean)
        })
        .collect()
}

/// Completion and drop statements in generated output.
pub fn extract_resolutions(text: &str) -> Vec<Resolution> {
    text.lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            // "- [x]" carries its own bullet
            let candidates = [trimmed, strip_bullet(trimmed)];
            candidates.iter().find_map(|candidate| {
                RESOLUTION_MARKERS.iter().find_map(|(marker, status)| {
                    strip_prefix_ci(candidate, marker).and_then(clean).map(|description| {
                        Resolution {
                            status: *status,
                            description,
                        }
                    })
                })
            })
        })
        .collect()
}

fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    if line.len() < prefix.len() || !line.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, rest) = line.split_at(prefix.len());
    head.eq_ignore_ascii_case(prefix).then_some(rest)
}

/// Remove a leading `-`, `*` or `+` bullet, but not a checkbox.
fn strip_bullet(line: &str) -> &str {
    if line.starts_with("- [") {
        return line;
    }
    for bullet in ["- ", "* ", "+ "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return rest.trim_start();
        }
    }
    line
}

/// The item text of an enumerated line, if it is one.
fn strip_enumeration(line: &str) -> Option<&str> {
    for checkbox in ["- [ ]", "* [ ]"] {
        if let Some(rest) = line.strip_prefix(checkbox) {
            return Some(rest);
        }
    }
    // completed checkboxes are not obligations
    if strip_prefix_ci(line, "- [x]").is_some() || strip_prefix_ci(line, "* [x]").is_some() {
        return None;
    }
    for bullet in ["- ", "* ", "+ "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return Some(rest);
        }
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        for sep in [". ", ") "] {
            if let Some(item) = rest.strip_prefix(sep) {
                return Some(item);
            }
        }
    }
    None
}

fn is_imperative(line: &str) -> bool {
    let lower = line.to_lowercase();
    IMPERATIVE_PREFIXES.iter().any(|prefix| {
        lower.starts_with(prefix)
            && lower[prefix.len()..]
                .chars()
                .next()
                .is_none_or(|c| c.is_whitespace())
    })
}

/// Trim and drop trailing punctuation; headings like "Requirements:" are not items.
fn clean(item: &str) -> Option<String> {
    let item = item.trim();
    if item.is_empty() || item.ends_with(':') {
        return None;
    }
    let item = item.trim_end_matches(['.', ';']).trim();
    (!item.is_empty()).then(|| item.to_string())
}
