//! Event sink port
//!
//! Streaming progress of a deliberation. Events of one session are emitted
//! in order from a single driver: every `delta` of a participant's message
//! precedes that message's `participant_complete`, which precedes the next
//! participant's `participant_start`.

use panel_domain::{ConclusionReason, ErrorCategory, ParticipantId, Phase, RiskLevel};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeliberationEvent {
    PhaseStart {
        phase: Phase,
        participants: usize,
    },
    /// Re-emitted with a higher `attempt` when a failed call is retried
    ParticipantStart {
        participant: ParticipantId,
        phase: Phase,
        round: usize,
        attempt: usize,
    },
    Delta {
        participant: ParticipantId,
        chunk: String,
    },
    ParticipantComplete {
        participant: ParticipantId,
        phase: Phase,
        sequence: u64,
    },
    PhaseComplete {
        phase: Phase,
        rounds: usize,
    },
    Converged {
        reason: ConclusionReason,
        rounds: usize,
        risk_level: RiskLevel,
    },
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        category: Option<ErrorCategory>,
        message: String,
    },
}

impl DeliberationEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DeliberationEvent::PhaseStart { .. } => "phase_start",
            DeliberationEvent::ParticipantStart { .. } => "participant_start",
            DeliberationEvent::Delta { .. } => "delta",
            DeliberationEvent::ParticipantComplete { .. } => "participant_complete",
            DeliberationEvent::PhaseComplete { .. } => "phase_complete",
            DeliberationEvent::Converged { .. } => "converged",
            DeliberationEvent::Error { .. } => "error",
        }
    }
}

/// Receives deliberation events.
///
/// Implementations live in the presentation and infrastructure layers and
/// must not block for long: they are called from the driving loop.
pub trait EventSink: Send + Sync {
    fn emit(&self, session_id: &str, event: &DeliberationEvent);
}

/// No-op sink for when progress reporting is not needed
pub struct NoEvents;

impl EventSink for NoEvents {
    fn emit(&self, _session_id: &str, _event: &DeliberationEvent) {}
}

/// A sink that delegates to multiple inner sinks in order.
#[derive(Default)]
pub struct CompositeEventSink {
    delegates: Vec<Arc<dyn EventSink>>,
}

impl CompositeEventSink {
    pub fn new(delegates: Vec<Arc<dyn EventSink>>) -> Self {
        Self { delegates }
    }

    pub fn push(&mut self, sink: Arc<dyn EventSink>) {
        self.delegates.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl EventSink for CompositeEventSink {
    fn emit(&self, session_id: &str, event: &DeliberationEvent) {
        for d in &self.delegates {
            d.emit(session_id, event);
        }
    }
}
