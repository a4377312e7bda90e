//! The compactable view of a session's message log.
//!
//! The permanent log on [`DiscussionSession`](crate::discussion::DiscussionSession)
//! is append-only. What is actually sent to the generation capability is the
//! [`WorkingWindow`]: copies of log messages, where an older prefix may have
//! been folded into a single synthesized summary entry.
//!
//! Compaction only ever folds a prefix, so ordering is preserved, and the
//! summary takes no sequence number.

use super::context_budget::ContextStatus;
use crate::discussion::entities::Message;
use crate::todo::{TodoAnchor, TodoItem};
use crate::util::{estimate_tokens, first_sentence};
use serde::{Deserialize, Serialize};

/// Longest digest line kept per folded message.
const DIGEST_SENTENCE_BYTES: usize = 160;

/// How aggressively to compact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompactionLevel {
    Standard,
    Emergency,
}

impl CompactionLevel {
    pub fn for_status(status: ContextStatus) -> Option<Self> {
        match status {
            ContextStatus::Compact => Some(CompactionLevel::Standard),
            ContextStatus::EmergencyCompact => Some(CompactionLevel::Emergency),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompactionLevel::Standard => "standard",
            CompactionLevel::Emergency => "emergency",
        }
    }
}

/// A synthesized message standing in for a folded prefix of the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub id: String,
    pub first_sequence: u64,
    pub last_sequence: u64,
    /// One `#seq author: first sentence` line per folded message
    pub digest: Vec<String>,
    /// Descriptions of todos anchored to folded entries
    pub obligations: Vec<String>,
}

impl SummaryEntry {
    pub fn render(&self) -> String {
        let mut text = format!(
            "[Summary of messages #{}-#{}]\n",
            self.first_sequence, self.last_sequence
        );
        for line in &self.digest {
            text.push_str(line);
            text.push('\n');
        }
        if !self.obligations.is_empty() {
            text.push_str("Open items raised in this part:\n");
            for obligation in &self.obligations {
                text.push_str(&format!("- {}\n", obligation));
            }
        }
        text
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum WindowEntry {
    Message(Message),
    Summary(SummaryEntry),
}

impl WindowEntry {
    pub fn render(&self) -> String {
        match self {
            WindowEntry::Message(m) => format!("#{} [{}] {}: {}\n", m.sequence, m.phase, m.author, m.content),
            WindowEntry::Summary(s) => s.render(),
        }
    }
}

/// What a compaction did; used to re-anchor todos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactionReport {
    pub level: CompactionLevel,
    pub folded_sequences: Vec<u64>,
    /// Earlier summaries merged into the new one
    pub folded_summaries: Vec<String>,
    pub summary_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingWindow {
    entries: Vec<WindowEntry>,
}

impl WorkingWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.entries.push(WindowEntry::Message(message));
    }

    pub fn entries(&self) -> &[WindowEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self) -> String {
        self.entries.iter().map(WindowEntry::render).collect()
    }

    /// Estimated token units of the rendered window.
    pub fn estimated_units(&self) -> usize {
        estimate_tokens(&self.render())
    }

    /// Fold everything except the last `keep_recent` entries into one summary.
    ///
    /// Returns `None` when there is nothing new to fold, which makes
    /// re-running compaction on a compacted window a no-op.
    pub fn compact(
        &mut self,
        level: CompactionLevel,
        keep_recent: usize,
        todos: &[TodoItem],
    ) -> Option<CompactionReport> {
        let split = self.entries.len().saturating_sub(keep_recent);
        let prefix = &self.entries[..split];

        let has_messages = prefix.iter().any(|e| matches!(e, WindowEntry::Message(_)));
        if !has_messages {
            return None;
        }

        let mut digest = Vec::new();
        let mut folded_sequences = Vec::new();
        let mut folded_summaries = Vec::new();
        let mut first_sequence = u64::MAX;
        let mut last_sequence = 0;

        for entry in prefix {
            match entry {
                WindowEntry::Message(m) => {
                    digest.push(format!(
                        "#{} {}: {}",
                        m.sequence,
                        m.author,
                        first_sentence(&m.content, DIGEST_SENTENCE_BYTES)
                    ));
                    folded_sequences.push(m.sequence);
                    first_sequence = first_sequence.min(m.sequence);
                    last_sequence = last_sequence.max(m.sequence);
                }
                WindowEntry::Summary(s) => {
                    digest.extend(s.digest.iter().cloned());
                    folded_summaries.push(s.id.clone());
                    first_sequence = first_sequence.min(s.first_sequence);
                    last_sequence = last_sequence.max(s.last_sequence);
                }
            }
        }

        let obligations = todos
            .iter()
            .filter(|t| t.is_pending())
            .filter(|t| match &t.anchor {
                Some(TodoAnchor::Message(seq)) => folded_sequences.contains(seq),
                Some(TodoAnchor::Summary(id)) => folded_summaries.contains(id),
                None => false,
            })
            .map(|t| t.description.clone())
            .collect();

        let summary = SummaryEntry {
            id: format!("summary-{}-{}", first_sequence, last_sequence),
            first_sequence,
            last_sequence,
            digest,
            obligations,
        };
        let summary_id = summary.id.clone();

        let kept = self.entries.split_off(split);
        self.entries = std::iter::once(WindowEntry::Summary(summary))
            .chain(kept)
            .collect();

        Some(CompactionReport {
            level,
            folded_sequences,
            folded_summaries,
            summary_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discussion::{Author, Phase};
    use crate::todo::TodoSource;
    use chrono::Utc;

    fn msg(seq: u64, content: &str) -> Message {
        Message {
            id: format!("m{}", seq),
            author: Author::Participant(format!("p{}", seq % 2).into()),
            phase: Phase::Debate,
            content: content.to_string(),
            timestamp: Utc::now(),
            sequence: seq,
        }
    }

    fn window(n: u64) -> WorkingWindow {
        let mut w = WorkingWindow::new();
        for seq in 1..=n {
            w.push(msg(seq, &format!("Point number {}. More detail follows here.", seq)));
        }
        w
    }

    fn sequences(w: &WorkingWindow) -> Vec<u64> {
        w.entries()
            .iter()
            .filter_map(|e| match e {
                WindowEntry::Message(m) => Some(m.sequence),
                WindowEntry::Summary(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_compaction_folds_prefix_and_keeps_order() {
        let mut w = window(8);
        let report = w.compact(CompactionLevel::Standard, 3, &[]).unwrap();

        assert_eq!(report.folded_sequences, vec![1, 2, 3, 4, 5]);
        assert_eq!(report.summary_id, "summary-1-5");
        assert_eq!(w.len(), 4);
        assert!(matches!(w.entries()[0], WindowEntry::Summary(_)));
        assert_eq!(sequences(&w), vec![6, 7, 8]);

        let rendered = w.render();
        assert!(rendered.contains("#1 p1: Point number 1.\n"));
    }

    #[test]
    fn test_compaction_is_idempotent() {
        let mut w = window(8);
        w.compact(CompactionLevel::Standard, 3, &[]).unwrap();
        let before = w.clone();
        assert!(w.compact(CompactionLevel::Standard, 3, &[]).is_none());
        assert_eq!(w, before);
    }

    #[test]
    fn test_emergency_merges_previous_summary() {
        let mut w = window(8);
        w.compact(CompactionLevel::Standard, 3, &[]).unwrap();
        let report = w.compact(CompactionLevel::Emergency, 1, &[]).unwrap();

        assert_eq!(report.folded_sequences, vec![6, 7]);
        assert_eq!(report.folded_summaries, vec!["summary-1-5".to_string()]);
        assert_eq!(report.summary_id, "summary-1-7");
        assert_eq!(sequences(&w), vec![8]);

        match &w.entries()[0] {
            WindowEntry::Summary(s) => assert_eq!(s.digest.len(), 7),
            other => panic!("expected summary, got {:?}", other),
        }
    }

    #[test]
    fn test_nothing_to_fold() {
        let mut w = window(2);
        assert!(w.compact(CompactionLevel::Standard, 6, &[]).is_none());
        assert!(WorkingWindow::new().compact(CompactionLevel::Emergency, 0, &[]).is_none());
    }

    #[test]
    fn test_summary_keeps_anchored_obligations() {
        let mut w = window(6);
        let todos = vec![
            TodoItem::new("todo-1", "benchmark writes", TodoSource::GeneratedOutput)
                .with_anchor(TodoAnchor::Message(2)),
            TodoItem::new("todo-2", "late item", TodoSource::GeneratedOutput)
                .with_anchor(TodoAnchor::Message(6)),
        ];
        w.compact(CompactionLevel::Standard, 2, &todos).unwrap();

        let rendered = w.render();
        assert!(rendered.contains("- benchmark writes"));
        assert!(!rendered.contains("- late item"));
    }

    #[test]
    fn test_units_shrink_after_compaction() {
        let mut w = WorkingWindow::new();
        for seq in 1..=10 {
            w.push(msg(seq, &format!("Short lead. {}", "long tail ".repeat(50))));
        }
        let before = w.estimated_units();
        w.compact(CompactionLevel::Emergency, 2, &[]).unwrap();
        assert!(w.estimated_units() < before);
    }
}
