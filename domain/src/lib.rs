//! Domain layer for copilot-panel
//!
//! This crate contains the core deliberation logic: entities, value objects
//! and pure decision functions. It has no dependencies on infrastructure,
//! async runtimes or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Deliberation
//!
//! A panel of role-specialised participants discusses a topic through
//! ordered phases (opening → exploration → debate → synthesis →
//! validation). A [`PhaseMachine`] decides after every round whether to
//! repeat the phase, advance, or conclude.
//!
//! ## Session resilience
//!
//! - [`ContextBudget`] / [`WorkingWindow`]: bounded context with compaction
//! - [`ErrorClassifier`] / [`RecoveryPolicy`]: typed error recovery
//! - [`TodoTracker`]: obligations that gate conclusion
//!
//! ## Outcome
//!
//! [`ReportGenerator`] reduces the transcript; [`classify_risk`] maps risk
//! factors to an approval gate.

pub mod context;
pub mod core;
pub mod decision;
pub mod discussion;
pub mod participant;
pub mod prompt;
pub mod recovery;
pub mod synthesis;
pub mod todo;
pub mod util;

// Re-export commonly used types
pub use context::{
    BudgetThresholds, CompactionLevel, CompactionReport, ContextBudget, ContextStatus,
    ContextUsage, WindowEntry, WorkingWindow,
};
pub use core::{
    error::DomainError,
    validation::{ConfigIssue, ConfigIssueCode, Severity},
};
pub use decision::{
    AssessmentInput, DecisionClassification, KeywordRiskAssessor, RiskFactor, RiskLevel,
    classify as classify_risk,
};
pub use discussion::{
    Author, ConclusionReason, ConvergenceContext, ConvergencePolicy, ConvergenceSignal,
    ConvergenceWeights, DiscussionSession, FixedConvergence, Message, NoveltyConvergence, Phase,
    PhaseMachine, PhasePlan, PhaseState, RepeatReason, SessionStatus, Transition,
};
pub use participant::{
    Participant, ParticipantCatalog, ParticipantId, ParticipantSelector, PhaseRoster, Selection,
    SelectionRequest, TopicRule,
};
pub use prompt::{PromptTemplate, TurnNotes};
pub use recovery::{
    ErrorCategory, ErrorClassifier, FailureKind, RecoveryAttempt, RecoveryOutcome, RecoveryPolicy,
    RecoveryStrategy, SessionFailure, classify as classify_error,
};
pub use synthesis::{ActionItem, ReportGenerator, SynthesisReport};
pub use todo::{StopCheck, TodoAnchor, TodoItem, TodoSource, TodoStatus, TodoTracker};
