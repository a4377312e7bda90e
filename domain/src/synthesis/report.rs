//! Reducing a finished deliberation into a structured report.

use crate::decision::DecisionClassification;
use crate::discussion::entities::{Author, DiscussionSession, Message};
use crate::discussion::state_machine::ConclusionReason;
use crate::participant::ParticipantId;
use crate::todo::{TodoItem, TodoStatus};
use crate::util::{first_sentence, normalize};
use serde::{Deserialize, Serialize};

/// Longest conclusion kept per message.
const CONCLUSION_BYTES: usize = 240;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub description: String,
    /// Always a member of the session's roster
    pub assignee: ParticipantId,
    pub source_todo: Option<String>,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisReport {
    pub summary: String,
    pub conclusions: Vec<String>,
    pub action_items: Vec<ActionItem>,
    pub open_obligations: Vec<TodoItem>,
    pub conclusion_reason: ConclusionReason,
    pub rounds_completed: usize,
}

/// Builds a [`SynthesisReport`] from the session log and tracked todos.
pub struct ReportGenerator;

impl ReportGenerator {
    pub fn generate(
        session: &DiscussionSession,
        todos: &[TodoItem],
        reason: ConclusionReason,
        classification: Option<&DecisionClassification>,
    ) -> SynthesisReport {
        let conclusions = Self::conclusions(session);
        let action_items: Vec<ActionItem> = todos
            .iter()
            .filter(|t| t.status != TodoStatus::Dropped)
            .filter_map(|t| Self::action_item(session, t))
            .collect();
        let open_obligations: Vec<TodoItem> =
            todos.iter().filter(|t| t.is_pending()).cloned().collect();

        let mut summary = if session.messages().is_empty() {
            format!("\"{}\": no discussion took place.", session.topic())
        } else {
            format!(
                "{} participant(s) discussed \"{}\" over {} round(s) and {}.",
                session.participants().len(),
                session.topic(),
                session.rounds_completed(),
                match reason {
                    ConclusionReason::Converged => "reached a conclusion",
                    ConclusionReason::RoundCeiling => "stopped at the round limit",
                }
            )
        };
        if let Some(lead) = conclusions.first() {
            summary.push_str(&format!(" Key conclusion: {}", lead));
        }
        summary.push_str(&format!(
            " {} action item(s), {} open obligation(s).",
            action_items.len(),
            open_obligations.len()
        ));
        if let Some(c) = classification {
            summary.push_str(&format!(" Risk: {} (score {}).", c.level, c.score));
        }

        SynthesisReport {
            summary,
            conclusions,
            action_items,
            open_obligations,
            conclusion_reason: reason,
            rounds_completed: session.rounds_completed(),
        }
    }

    /// First sentences of the latest round of the last phase reached.
    fn conclusions(session: &DiscussionSession) -> Vec<String> {
        let contributions: Vec<&Message> = session
            .messages()
            .iter()
            .filter(|m| matches!(m.author, Author::Participant(_)))
            .collect();
        let Some(last_phase) = contributions.last().map(|m| m.phase) else {
            return Vec::new();
        };

        let in_phase: Vec<&Message> = contributions
            .into_iter()
            .filter(|m| m.phase == last_phase)
            .collect();
        let round_size = session.participants().len().max(1);
        let latest = &in_phase[in_phase.len().saturating_sub(round_size)..];

        let mut seen = Vec::new();
        let mut conclusions = Vec::new();
        for message in latest {
            let sentence = first_sentence(&message.content, CONCLUSION_BYTES);
            let key = normalize(&sentence);
            if key.is_empty() || seen.contains(&key) {
                continue;
            }
            seen.push(key);
            conclusions.push(sentence);
        }
        conclusions
    }

    fn action_item(session: &DiscussionSession, todo: &TodoItem) -> Option<ActionItem> {
        let first = session.participants().first()?;
        let (description, mentioned) = split_mention(&todo.description);

        // The permanent log keeps every message, so this holds after compaction
        let source_author = todo
            .source_sequence
            .and_then(|seq| session.message_by_sequence(seq))
            .and_then(|m| m.author.participant_id().cloned());

        let assignee = mentioned
            .or(source_author)
            .filter(|id| session.has_participant(id))
            .unwrap_or_else(|| first.clone());

        Some(ActionItem {
            description,
            assignee,
            source_todo: Some(todo.id.clone()),
            done: todo.status == TodoStatus::Completed,
        })
    }
}

/// Remove an `@participant` mention, returning the cleaned text and the id.
fn split_mention(text: &str) -> (String, Option<ParticipantId>) {
    let mut mention = None;
    let words: Vec<&str> = text
        .split_whitespace()
        .filter(|word| {
            if mention.is_none()
                && let Some(id) = word.strip_prefix('@')
            {
                let id = id.trim_end_matches(|c: char| !c.is_alphanumeric() && c != '_');
                if !id.is_empty() {
                    mention = Some(ParticipantId::new(id));
                    return false;
                }
            }
            true
        })
        .collect();
    (words.join(" "), mention)
}
