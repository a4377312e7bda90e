//! Application layer for copilot-panel
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::DeliberationParams;
pub use ports::{
    event_sink::{CompositeEventSink, DeliberationEvent, EventSink, NoEvents},
    generation::{
        ChatRole, ChatTurn, GatewayError, GenerationGateway, GenerationRequest, StreamEvent,
        StreamHandle,
    },
    session_store::{SessionArchive, SessionSnapshot, SessionStore, StoreError},
};
pub use use_cases::recover_session::{RecoveryResult, RetryFn, Retryable, SessionRecovery};
pub use use_cases::run_deliberation::{
    AbortedSession, DeliberationOutcome, RunDeliberationError, RunDeliberationInput,
    RunDeliberationUseCase,
};
