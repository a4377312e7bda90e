//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// These are configuration or programming errors: they are surfaced to the
/// caller immediately and never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Participant catalog is empty")]
    EmptyCatalog,

    #[error("No participants available for phase '{phase}' and the given topic")]
    NoParticipants { phase: String },

    #[error("None of the requested participants are known: {0:?}")]
    UnknownParticipants(Vec<String>),

    #[error("Invalid risk factor '{name}': {reason}")]
    InvalidRiskFactor { name: String, reason: String },

    #[error("Invalid todo transition for '{id}': {from} -> {to}")]
    InvalidTodoTransition {
        id: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("Unknown todo item: {0}")]
    UnknownTodo(String),

    #[error("Session {id} is {status}, not active")]
    SessionNotActive { id: String, status: &'static str },

    #[error("Tracker belongs to session {expected}, not {actual}")]
    SessionMismatch { expected: String, actual: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DomainError {
    /// Whether this error came from participant selection.
    pub fn is_selection_error(&self) -> bool {
        matches!(
            self,
            DomainError::EmptyCatalog
                | DomainError::NoParticipants { .. }
                | DomainError::UnknownParticipants(_)
        )
    }

    /// Whether this error came from decision classification input.
    pub fn is_classification_error(&self) -> bool {
        matches!(self, DomainError::InvalidRiskFactor { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = DomainError::InvalidRiskFactor {
            name: "scope".to_string(),
            reason: "score 25 exceeds 20".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid risk factor 'scope': score 25 exceeds 20"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert!(DomainError::EmptyCatalog.is_selection_error());
        assert!(DomainError::UnknownParticipants(vec!["x".into()]).is_selection_error());
        assert!(!DomainError::EmptyCatalog.is_classification_error());
        assert!(
            DomainError::InvalidRiskFactor {
                name: "a".into(),
                reason: "b".into()
            }
            .is_classification_error()
        );
    }
}
