//! Discussion domain
//!
//! Sessions, messages, phases and the state machine that moves a
//! deliberation from opening to conclusion.

pub mod convergence;
pub mod entities;
pub mod phase;
pub mod state_machine;

pub use convergence::{
    ConvergenceContext, ConvergencePolicy, ConvergenceSignal, ConvergenceWeights,
    FixedConvergence, NoveltyConvergence,
};
pub use entities::{Author, DiscussionSession, Message, PhaseState, SessionStatus};
pub use phase::Phase;
pub use state_machine::{
    ConclusionReason, DEFAULT_MAX_EXTRA_ROUNDS, DEFAULT_MAX_TOTAL_ROUNDS, PhaseMachine, PhasePlan,
    RepeatReason, Transition,
};
