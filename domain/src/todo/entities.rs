//! Todo entities

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Where an obligation was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoSource {
    Requirement,
    GeneratedOutput,
}

impl TodoSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoSource::Requirement => "requirement",
            TodoSource::GeneratedOutput => "generated_output",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    Completed,
    Dropped,
}

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::Pending => "pending",
            TodoStatus::Completed => "completed",
            TodoStatus::Dropped => "dropped",
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, TodoStatus::Pending)
    }
}

impl std::fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The log entry an obligation was extracted from.
///
/// Starts as a message sequence number; after that message is folded
/// into a compaction summary it points at the summary instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "ref")]
pub enum TodoAnchor {
    Message(u64),
    Summary(String),
}

/// A tracked obligation.
///
/// Never deleted; only its status changes, and only away from `pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub description: String,
    pub source: TodoSource,
    pub status: TodoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<TodoAnchor>,
    /// Sequence of the message the item was extracted from.
    ///
    /// Unlike `anchor` this survives compaction; the permanent log still
    /// holds that message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_sequence: Option<u64>,
}

impl TodoItem {
    pub fn new(id: impl Into<String>, description: impl Into<String>, source: TodoSource) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            source,
            status: TodoStatus::Pending,
            anchor: None,
            source_sequence: None,
        }
    }

    /// Set the anchor; a message anchor also records the source sequence.
    pub fn with_anchor(mut self, anchor: TodoAnchor) -> Self {
        if let TodoAnchor::Message(seq) = anchor {
            self.source_sequence = Some(seq);
        }
        self.anchor = Some(anchor);
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == TodoStatus::Pending
    }

    /// Move to `to`.
    ///
    /// Allowed: `pending → completed`, `pending → dropped`, and re-applying
    /// the current status. Everything else is rejected.
    pub fn transition(&mut self, to: TodoStatus) -> Result<(), DomainError> {
        if self.status == to {
            return Ok(());
        }
        if self.status != TodoStatus::Pending || to == TodoStatus::Pending {
            return Err(DomainError::InvalidTodoTransition {
                id: self.id.clone(),
                from: self.status.as_str(),
                to: to.as_str(),
            });
        }
        self.status = to;
        Ok(())
    }
}
