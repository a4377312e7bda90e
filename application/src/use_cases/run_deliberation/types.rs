//! Type definitions for the RunDeliberation use case.

use panel_domain::{
    DecisionClassification, DiscussionSession, DomainError, RiskFactor, SessionFailure,
    SynthesisReport, TodoItem,
};
use serde::Serialize;
use thiserror::Error;

/// Input for one deliberation.
#[derive(Debug, Clone, Default)]
pub struct RunDeliberationInput {
    pub topic: String,
    /// Free-text background shown to every participant
    pub context: String,
    /// Project phase used to pick the core participants (e.g. `design`)
    pub project_phase: String,
    /// Explicit participant ids; bypasses automatic selection
    pub explicit_participants: Option<Vec<String>>,
    /// Requirement text whose obligations gate conclusion
    pub requirements: Option<String>,
    /// Session id to use instead of a generated one
    pub session_id: Option<String>,
    /// Explicit risk factors; derived from the transcript when absent
    pub risk_factors: Option<Vec<RiskFactor>>,
}

impl RunDeliberationInput {
    pub fn new(topic: impl Into<String>, project_phase: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            project_phase: project_phase.into(),
            ..Self::default()
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_participants(mut self, ids: Vec<String>) -> Self {
        self.explicit_participants = Some(ids);
        self
    }

    pub fn with_requirements(mut self, requirements: impl Into<String>) -> Self {
        self.requirements = Some(requirements.into());
        self
    }

    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn with_risk_factors(mut self, factors: Vec<RiskFactor>) -> Self {
        self.risk_factors = Some(factors);
        self
    }
}

/// A concluded deliberation.
#[derive(Debug, Clone, Serialize)]
pub struct DeliberationOutcome {
    pub session: DiscussionSession,
    pub report: SynthesisReport,
    pub classification: DecisionClassification,
    pub todos: Vec<TodoItem>,
}

/// Final state of an aborted deliberation.
#[derive(Debug, Clone, Serialize)]
pub struct AbortedSession {
    pub session: DiscussionSession,
    pub failure: SessionFailure,
    pub todos: Vec<TodoItem>,
}

/// Errors that can occur during a deliberation
#[derive(Error, Debug)]
pub enum RunDeliberationError {
    #[error("Participant selection failed: {0}")]
    Selection(#[source] DomainError),

    #[error("Invalid risk factors: {0}")]
    Classification(#[source] DomainError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[source] DomainError),

    #[error("Session error: {0}")]
    Session(#[source] DomainError),

    #[error("Deliberation aborted: {}", .0.failure.user_message)]
    Aborted(Box<AbortedSession>),
}

impl RunDeliberationError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            RunDeliberationError::Aborted(aborted)
                if aborted.failure.kind == panel_domain::FailureKind::Cancelled
        )
    }

    /// The aborted session, if the deliberation got that far
    pub fn aborted(&self) -> Option<&AbortedSession> {
        match self {
            RunDeliberationError::Aborted(aborted) => Some(aborted),
            _ => None,
        }
    }
}

/// Why a running deliberation stopped before concluding.
pub(super) enum Interrupted {
    Failed(SessionFailure),
    Invalid(DomainError),
}

impl Interrupted {
    pub(super) fn into_failure(self) -> SessionFailure {
        match self {
            Interrupted::Failed(failure) => failure,
            Interrupted::Invalid(e) => SessionFailure::internal(e.to_string()),
        }
    }
}

impl From<DomainError> for Interrupted {
    fn from(e: DomainError) -> Self {
        Interrupted::Invalid(e)
    }
}
