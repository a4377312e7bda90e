//! Participant catalog entries

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a participant role (e.g. `architect`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A role-specialized simulated discussant (catalog entry).
///
/// Participants are immutable; a session selects them, it never creates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    /// Human-readable role name, e.g. "Software Architect"
    pub display_role: String,
    /// Competency tags used for topic matching (e.g. `api`, `database`)
    #[serde(default)]
    pub focus: Vec<String>,
    /// Behavioral style tags injected into the prompt (e.g. `skeptical`)
    #[serde(default)]
    pub style: Vec<String>,
}

impl Participant {
    pub fn new(id: impl Into<ParticipantId>, display_role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_role: display_role.into(),
            focus: Vec::new(),
            style: Vec::new(),
        }
    }

    pub fn with_focus(mut self, tags: &[&str]) -> Self {
        self.focus = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_style(mut self, tags: &[&str]) -> Self {
        self.style = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Whether any of this participant's focus tags is in `tags`
    /// (case-insensitive).
    pub fn has_any_focus(&self, tags: &[String]) -> bool {
        self.focus
            .iter()
            .any(|f| tags.iter().any(|t| t.eq_ignore_ascii_case(f)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_builder() {
        let p = Participant::new("architect", "Software Architect")
            .with_focus(&["architecture", "api"])
            .with_style(&["pragmatic"]);
        assert_eq!(p.id.as_str(), "architect");
        assert_eq!(p.focus, vec!["architecture", "api"]);
        assert_eq!(p.style, vec!["pragmatic"]);
    }

    #[test]
    fn test_has_any_focus_is_case_insensitive() {
        let p = Participant::new("qa", "QA Engineer").with_focus(&["testing"]);
        assert!(p.has_any_focus(&["Testing".to_string()]));
        assert!(!p.has_any_focus(&["security".to_string()]));
    }

    #[test]
    fn test_participant_id_serializes_transparently() {
        let id = ParticipantId::new("designer");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"designer\"");
    }
}
