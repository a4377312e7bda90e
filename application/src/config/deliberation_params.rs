//! Deliberation parameters: round loop control.
//!
//! [`DeliberationParams`] groups the static parameters that control the
//! round loop in [`RunDeliberationUseCase`](crate::use_cases::run_deliberation::RunDeliberationUseCase).
//! Thresholds and recovery limits are domain policy and live in their own
//! domain types.

use panel_domain::discussion::{DEFAULT_MAX_EXTRA_ROUNDS, DEFAULT_MAX_TOTAL_ROUNDS};
use panel_domain::participant::DEFAULT_MAX_PARTICIPANTS;
use panel_domain::{DomainError, Phase, PhasePlan};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Round loop control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliberationParams {
    /// Phases to run, in order.
    pub phases: Vec<Phase>,
    /// Extra rounds a phase may take on insufficient consensus.
    pub max_extra_rounds: usize,
    /// Hard global round ceiling.
    pub max_total_rounds: usize,
    /// Participant cap passed to the selector.
    pub max_participants: usize,
    /// `max_tokens` sent with every generation request.
    pub max_tokens: u32,
    /// Timeout for a single generation call.
    pub call_timeout: Option<Duration>,
}

impl Default for DeliberationParams {
    fn default() -> Self {
        Self {
            phases: Phase::ALL.to_vec(),
            max_extra_rounds: DEFAULT_MAX_EXTRA_ROUNDS,
            max_total_rounds: DEFAULT_MAX_TOTAL_ROUNDS,
            max_participants: DEFAULT_MAX_PARTICIPANTS,
            max_tokens: 1024,
            call_timeout: Some(Duration::from_secs(120)),
        }
    }
}

impl DeliberationParams {
    // ==================== Builder Methods ====================

    pub fn with_phases(mut self, phases: Vec<Phase>) -> Self {
        self.phases = phases;
        self
    }

    pub fn with_max_extra_rounds(mut self, max: usize) -> Self {
        self.max_extra_rounds = max;
        self
    }

    pub fn with_max_total_rounds(mut self, max: usize) -> Self {
        self.max_total_rounds = max;
        self
    }

    pub fn with_max_participants(mut self, max: usize) -> Self {
        self.max_participants = max;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Build the phase plan driven by these parameters.
    pub fn phase_plan(&self) -> Result<PhasePlan, DomainError> {
        PhasePlan::new(
            self.phases.clone(),
            self.max_extra_rounds,
            self.max_total_rounds,
        )
    }
}
