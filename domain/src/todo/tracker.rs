//! Task continuation tracking for one session.
//!
//! The tracker owns the session's [`TodoItem`]s. It reads messages but never
//! touches the log; the driver feeds it text and applies its answers.

use super::entities::{TodoAnchor, TodoItem, TodoSource, TodoStatus};
use super::extractor::{extract_marked, extract_requirements, extract_resolutions};
use crate::context::working_window::CompactionReport;
use crate::core::error::DomainError;
use crate::util::{content_words, normalize};
use serde::{Deserialize, Serialize};

/// Fewest words a resolution needs to close an item it only partly names.
const MIN_PARTIAL_WORDS: usize = 2;

/// Answer of [`TodoTracker::check_can_stop`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopCheck {
    pub can_stop: bool,
    pub incomplete: Vec<TodoItem>,
    /// Instructions describing what remains, empty when `can_stop`
    pub directive: String,
}

/// Tracks obligations for exactly one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoTracker {
    session_id: String,
    items: Vec<TodoItem>,
    next_id: usize,
}

impl TodoTracker {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            items: Vec::new(),
            next_id: 1,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&TodoItem> {
        self.items.iter().find(|t| t.id == id)
    }

    pub fn pending(&self) -> impl Iterator<Item = &TodoItem> {
        self.items.iter().filter(|t| t.is_pending())
    }

    pub fn has_pending(&self) -> bool {
        self.items.iter().any(|t| t.is_pending())
    }

    /// Extract obligations from `text` and start tracking them.
    ///
    /// Descriptions already tracked (compared case- and
    /// whitespace-insensitively) are merged into the existing item.
    /// Returns only the newly created items.
    pub fn extract(
        &mut self,
        text: &str,
        source: TodoSource,
        anchor: Option<u64>,
    ) -> Vec<TodoItem> {
        let descriptions = match source {
            TodoSource::Requirement => extract_requirements(text),
            TodoSource::GeneratedOutput => extract_marked(text),
        };

        let mut created = Vec::new();
        for description in descriptions {
            let key = normalize(&description);
            if self.items.iter().any(|t| normalize(&t.description) == key) {
                continue;
            }

            let mut item = TodoItem::new(format!("todo-{}", self.next_id), description, source);
            self.next_id += 1;
            if let Some(sequence) = anchor {
                item = item.with_anchor(TodoAnchor::Message(sequence));
            }
            self.items.push(item.clone());
            created.push(item);
        }
        created
    }

    /// Apply `DONE:` / `DROPPED:` / `- [x]` statements found in `text`.
    ///
    /// See [`Self::resolution_target`] for how a statement picks its item.
    /// Returns the ids and new statuses of the items that changed.
    pub fn apply_resolutions(&mut self, text: &str) -> Vec<(String, TodoStatus)> {
        let mut changed = Vec::new();
        for resolution in extract_resolutions(text) {
            let wanted = words(&resolution.description);
            if wanted.is_empty() {
                continue;
            }
            let Some(index) = self.resolution_target(&wanted) else {
                continue;
            };
            let item = &mut self.items[index];
            if item.transition(resolution.status).is_ok() {
                changed.push((item.id.clone(), resolution.status));
            }
        }
        changed
    }

    /// The pending item a resolution names.
    ///
    /// A word-for-word match wins outright. Otherwise one side must contain
    /// the other as a whole-word phrase of at least [`MIN_PARTIAL_WORDS`]
    /// words, and the item differing by the fewest words is chosen (earliest
    /// on ties).
    fn resolution_target(&self, wanted: &[String]) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (index, item) in self.items.iter().enumerate() {
            if !item.is_pending() {
                continue;
            }
            let have = words(&item.description);
            if have == wanted {
                return Some(index);
            }
            let (short, long) = if have.len() <= wanted.len() {
                (&have[..], wanted)
            } else {
                (wanted, &have[..])
            };
            if short.len() < MIN_PARTIAL_WORDS || !contains_phrase(long, short) {
                continue;
            }
            let distance = long.len() - short.len();
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((index, distance));
            }
        }
        best.map(|(index, _)| index)
    }

    pub fn complete(&mut self, id: &str) -> Result<(), DomainError> {
        self.item_mut(id)?.transition(TodoStatus::Completed)
    }

    pub fn drop_item(&mut self, id: &str) -> Result<(), DomainError> {
        self.item_mut(id)?.transition(TodoStatus::Dropped)
    }

    /// Point todos anchored to folded entries at the new summary.
    pub fn reanchor(&mut self, report: &CompactionReport) {
        for item in &mut self.items {
            let folded = match &item.anchor {
                Some(TodoAnchor::Message(seq)) => report.folded_sequences.contains(seq),
                Some(TodoAnchor::Summary(id)) => report.folded_summaries.contains(id),
                None => false,
            };
            if folded {
                item.anchor = Some(TodoAnchor::Summary(report.summary_id.clone()));
            }
        }
    }

    /// Whether `session_id` may conclude.
    ///
    /// `can_stop` is true iff no tracked item is pending.
    pub fn check_can_stop(&self, session_id: &str) -> Result<StopCheck, DomainError> {
        if session_id != self.session_id {
            return Err(DomainError::SessionMismatch {
                expected: self.session_id.clone(),
                actual: session_id.to_string(),
            });
        }

        let incomplete: Vec<TodoItem> = self.pending().cloned().collect();
        if incomplete.is_empty() {
            return Ok(StopCheck {
                can_stop: true,
                incomplete,
                directive: String::new(),
            });
        }

        let mut directive = String::from(
            "The discussion cannot conclude yet. These obligations are still open:\n",
        );
        for item in &incomplete {
            directive.push_str(&format!("- [{}] {}\n", item.id, item.description));
        }
        directive.push_str(
            "Resolve each one. Mark finished items with `DONE: <description>` \
             and items that should be abandoned with `DROPPED: <description>`.",
        );

        Ok(StopCheck {
            can_stop: false,
            incomplete,
            directive,
        })
    }

    fn item_mut(&mut self, id: &str) -> Result<&mut TodoItem, DomainError> {
        self.items
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| DomainError::UnknownTodo(id.to_string()))
    }
}

fn words(text: &str) -> Vec<String> {
    content_words(text, 1).collect()
}

fn contains_phrase(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}
