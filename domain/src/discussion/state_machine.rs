//! Phase state machine for a deliberation.
//!
//! The machine only tracks counters and decides transitions. The driver
//! runs the rounds, asks the convergence policy for a signal and feeds it
//! back through [`PhaseMachine::record_round`].
//!
//! ```text
//! Opening ──▶ Exploration ──▶ Debate ──▶ Synthesis ──▶ Validation ──▶ concluded
//!    ↺             ↺             ↺            ↺             ↺
//!  (continue while round budget remains, pending obligations hold the final phase)
//! ```

use super::convergence::ConvergenceSignal;
use super::phase::Phase;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default hard ceiling on rounds across all phases.
pub const DEFAULT_MAX_TOTAL_ROUNDS: usize = 12;

/// Default number of extra rounds a phase may take beyond its target.
pub const DEFAULT_MAX_EXTRA_ROUNDS: usize = 1;

/// Why the deliberation concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConclusionReason {
    /// The final phase signalled convergence with no open obligations
    Converged,
    /// The global round ceiling was reached
    RoundCeiling,
}

impl ConclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConclusionReason::Converged => "converged",
            ConclusionReason::RoundCeiling => "round_ceiling",
        }
    }
}

/// Why a phase is being repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatReason {
    InsufficientConsensus,
    PendingObligations,
}

/// Decision taken after a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Repeat { phase: Phase, reason: RepeatReason },
    Advance { from: Phase, to: Phase },
    Conclude { from: Phase, reason: ConclusionReason },
}

/// Phase sequence and round limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhasePlan {
    phases: Vec<Phase>,
    targets: BTreeMap<Phase, usize>,
    max_extra_rounds: usize,
    max_total_rounds: usize,
}

impl PhasePlan {
    /// Build a plan. Phases must be non-empty and strictly ascending.
    pub fn new(
        phases: Vec<Phase>,
        max_extra_rounds: usize,
        max_total_rounds: usize,
    ) -> Result<Self, DomainError> {
        if phases.is_empty() {
            return Err(DomainError::InvalidConfig(
                "phase sequence must not be empty".to_string(),
            ));
        }
        if phases.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DomainError::InvalidConfig(
                "phases must be unique and in deliberation order".to_string(),
            ));
        }
        if max_total_rounds == 0 {
            return Err(DomainError::InvalidConfig(
                "max_total_rounds must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            phases,
            targets: BTreeMap::new(),
            max_extra_rounds,
            max_total_rounds,
        })
    }

    /// Override the target round count of one phase (minimum 1).
    pub fn with_target(mut self, phase: Phase, rounds: usize) -> Self {
        self.targets.insert(phase, rounds.max(1));
        self
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn max_extra_rounds(&self) -> usize {
        self.max_extra_rounds
    }

    pub fn max_total_rounds(&self) -> usize {
        self.max_total_rounds
    }

    pub fn target_for(&self, phase: Phase) -> usize {
        self.targets
            .get(&phase)
            .copied()
            .unwrap_or_else(|| phase.target_rounds())
    }

    /// Rounds a phase may take before an advance is forced.
    pub fn round_budget(&self, phase: Phase) -> usize {
        self.target_for(phase) + self.max_extra_rounds
    }

    /// Sum of target rounds over the plan, capped by the global ceiling.
    pub fn total_target_rounds(&self) -> usize {
        self.phases
            .iter()
            .map(|p| self.target_for(*p))
            .sum::<usize>()
            .min(self.max_total_rounds)
    }
}

impl Default for PhasePlan {
    fn default() -> Self {
        Self {
            phases: Phase::ALL.to_vec(),
            targets: BTreeMap::new(),
            max_extra_rounds: DEFAULT_MAX_EXTRA_ROUNDS,
            max_total_rounds: DEFAULT_MAX_TOTAL_ROUNDS,
        }
    }
}

/// Drives a session through its [`PhasePlan`].
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    plan: PhasePlan,
    index: usize,
    rounds_in_phase: usize,
    total_rounds: usize,
    concluded: Option<ConclusionReason>,
}

impl PhaseMachine {
    pub fn new(plan: PhasePlan) -> Self {
        Self {
            plan,
            index: 0,
            rounds_in_phase: 0,
            total_rounds: 0,
            concluded: None,
        }
    }

    pub fn plan(&self) -> &PhasePlan {
        &self.plan
    }

    /// Phase whose next round is about to run, `None` once concluded.
    pub fn current(&self) -> Option<Phase> {
        if self.concluded.is_some() {
            return None;
        }
        self.plan.phases.get(self.index).copied()
    }

    pub fn rounds_in_phase(&self) -> usize {
        self.rounds_in_phase
    }

    pub fn total_rounds(&self) -> usize {
        self.total_rounds
    }

    pub fn conclusion(&self) -> Option<ConclusionReason> {
        self.concluded
    }

    pub fn is_final_phase(&self) -> bool {
        self.index + 1 == self.plan.phases.len()
    }

    /// Whether the round about to start is the first of its phase.
    pub fn is_phase_start(&self) -> bool {
        self.rounds_in_phase == 0
    }

    /// Record a completed round and decide what happens next.
    ///
    /// `obligations_pending` is the inverse of the todo tracker's stop
    /// check; it only matters when the final phase wants to conclude.
    pub fn record_round(
        &mut self,
        signal: ConvergenceSignal,
        obligations_pending: bool,
    ) -> Result<Transition, DomainError> {
        let Some(phase) = self.current() else {
            return Err(DomainError::InvalidConfig(
                "deliberation already concluded".to_string(),
            ));
        };

        self.total_rounds += 1;
        self.rounds_in_phase += 1;

        if self.total_rounds >= self.plan.max_total_rounds {
            return Ok(self.conclude(phase, ConclusionReason::RoundCeiling));
        }

        if signal == ConvergenceSignal::Continue
            && self.rounds_in_phase < self.plan.round_budget(phase)
        {
            return Ok(Transition::Repeat {
                phase,
                reason: RepeatReason::InsufficientConsensus,
            });
        }

        if self.is_final_phase() {
            if obligations_pending {
                return Ok(Transition::Repeat {
                    phase,
                    reason: RepeatReason::PendingObligations,
                });
            }
            return Ok(self.conclude(phase, ConclusionReason::Converged));
        }

        self.index += 1;
        self.rounds_in_phase = 0;
        let to = self.plan.phases[self.index];
        Ok(Transition::Advance { from: phase, to })
    }

    fn conclude(&mut self, from: Phase, reason: ConclusionReason) -> Transition {
        self.concluded = Some(reason);
        Transition::Conclude { from, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConvergenceSignal::{Advance, Continue};

    fn machine(phases: Vec<Phase>, extra: usize, ceiling: usize) -> PhaseMachine {
        PhaseMachine::new(PhasePlan::new(phases, extra, ceiling).unwrap())
    }

    #[test]
    fn test_plan_validation() {
        assert!(PhasePlan::new(vec![], 1, 10).is_err());
        assert!(PhasePlan::new(vec![Phase::Debate, Phase::Opening], 1, 10).is_err());
        assert!(PhasePlan::new(vec![Phase::Debate, Phase::Debate], 1, 10).is_err());
        assert!(PhasePlan::new(vec![Phase::Opening], 1, 0).is_err());
        assert!(PhasePlan::new(vec![Phase::Opening, Phase::Synthesis], 0, 4).is_ok());
    }

    #[test]
    fn test_advance_walks_phases_in_order() {
        let mut m = machine(vec![Phase::Opening, Phase::Debate, Phase::Synthesis], 0, 20);

        assert_eq!(
            m.record_round(Advance, false).unwrap(),
            Transition::Advance {
                from: Phase::Opening,
                to: Phase::Debate
            }
        );
        assert!(m.is_phase_start());
        assert_eq!(
            m.record_round(Advance, false).unwrap(),
            Transition::Advance {
                from: Phase::Debate,
                to: Phase::Synthesis
            }
        );
        assert_eq!(
            m.record_round(Advance, false).unwrap(),
            Transition::Conclude {
                from: Phase::Synthesis,
                reason: ConclusionReason::Converged
            }
        );
        assert_eq!(m.current(), None);
        assert!(m.record_round(Advance, false).is_err());
    }

    #[test]
    fn test_continue_repeats_until_budget_spent() {
        // Debate target 2 + 1 extra = 3 rounds at most
        let mut m = machine(vec![Phase::Debate, Phase::Synthesis], 1, 20);

        for _ in 0..2 {
            assert_eq!(
                m.record_round(Continue, false).unwrap(),
                Transition::Repeat {
                    phase: Phase::Debate,
                    reason: RepeatReason::InsufficientConsensus
                }
            );
        }
        assert_eq!(
            m.record_round(Continue, false).unwrap(),
            Transition::Advance {
                from: Phase::Debate,
                to: Phase::Synthesis
            }
        );
    }

    #[test]
    fn test_pending_obligations_hold_final_phase() {
        let mut m = machine(vec![Phase::Synthesis], 0, 10);

        assert_eq!(
            m.record_round(Advance, true).unwrap(),
            Transition::Repeat {
                phase: Phase::Synthesis,
                reason: RepeatReason::PendingObligations
            }
        );
        assert_eq!(
            m.record_round(Advance, false).unwrap(),
            Transition::Conclude {
                from: Phase::Synthesis,
                reason: ConclusionReason::Converged
            }
        );
    }

    #[test]
    fn test_ceiling_terminates_always_continue() {
        let mut m = machine(vec![Phase::Opening], 100, 3);
        let mut transitions = Vec::new();
        while m.current().is_some() {
            transitions.push(m.record_round(Continue, true).unwrap());
        }
        assert_eq!(transitions.len(), 3);
        assert_eq!(m.conclusion(), Some(ConclusionReason::RoundCeiling));
        assert_eq!(m.total_rounds(), 3);
    }

    #[test]
    fn test_target_override() {
        let plan = PhasePlan::new(vec![Phase::Exploration], 0, 10)
            .unwrap()
            .with_target(Phase::Exploration, 4);
        assert_eq!(plan.target_for(Phase::Exploration), 4);
        assert_eq!(plan.round_budget(Phase::Exploration), 4);
        assert_eq!(plan.total_target_rounds(), 4);
        assert_eq!(PhasePlan::default().total_target_rounds(), 7);
    }
}
