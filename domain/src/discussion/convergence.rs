//! Convergence check: repeat the current phase or move on?
//!
//! The check is a pluggable policy. [`NoveltyConvergence`] is the default:
//! it compares how much new vocabulary a round introduced against how far
//! the phase already is past its target round count. The weights are a
//! tunable policy, not a fixed contract.

use super::entities::Message;
use super::phase::Phase;
use crate::util::content_words;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Outcome of a convergence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceSignal {
    /// Discussion quality is insufficient; repeat the phase if budget remains
    Continue,
    /// The phase has done its job
    Advance,
}

/// Everything a policy may look at after a round.
#[derive(Debug, Clone, Copy)]
pub struct ConvergenceContext<'a> {
    pub phase: Phase,
    /// Rounds completed in this phase, including the one just finished
    pub rounds_in_phase: usize,
    pub target_rounds: usize,
    /// Messages produced by the round just finished
    pub round_messages: &'a [Message],
    /// All earlier messages of the session
    pub prior_messages: &'a [Message],
}

/// Decides whether a phase should be repeated.
pub trait ConvergencePolicy: Send + Sync {
    fn evaluate(&self, ctx: &ConvergenceContext<'_>) -> ConvergenceSignal;
}

/// Always returns the same signal.
#[derive(Debug, Clone, Copy)]
pub struct FixedConvergence(pub ConvergenceSignal);

impl ConvergencePolicy for FixedConvergence {
    fn evaluate(&self, _ctx: &ConvergenceContext<'_>) -> ConvergenceSignal {
        self.0
    }
}

/// Tunable weights for [`NoveltyConvergence`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceWeights {
    pub novelty_weight: f64,
    pub progress_weight: f64,
    /// Minimum weighted score for another round
    pub threshold: f64,
}

impl Default for ConvergenceWeights {
    fn default() -> Self {
        Self {
            novelty_weight: 1.0,
            progress_weight: 0.5,
            threshold: 0.2,
        }
    }
}

/// Minimum word length counted as content.
const MIN_WORD_LEN: usize = 4;

/// Default convergence heuristic.
///
/// - Below the phase target: always `Continue`.
/// - At or past the target: `Continue` while
///   `novelty_weight * novelty - progress_weight * (rounds / target) >= threshold`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoveltyConvergence {
    weights: ConvergenceWeights,
}

impl NoveltyConvergence {
    pub fn new(weights: ConvergenceWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ConvergenceWeights {
        &self.weights
    }

    /// Share of distinct content words in `round` not present in `prior`.
    pub fn novelty(round: &[Message], prior: &[Message]) -> f64 {
        let seen: HashSet<String> = prior
            .iter()
            .flat_map(|m| content_words(&m.content, MIN_WORD_LEN))
            .collect();
        let current: HashSet<String> = round
            .iter()
            .flat_map(|m| content_words(&m.content, MIN_WORD_LEN))
            .collect();

        if current.is_empty() {
            return 0.0;
        }
        let fresh = current.iter().filter(|w| !seen.contains(*w)).count();
        fresh as f64 / current.len() as f64
    }

    /// Weighted score for the round; higher means "keep talking".
    pub fn score(&self, ctx: &ConvergenceContext<'_>) -> f64 {
        let novelty = Self::novelty(ctx.round_messages, ctx.prior_messages);
        let progress = ctx.rounds_in_phase as f64 / ctx.target_rounds.max(1) as f64;
        self.weights.novelty_weight * novelty - self.weights.progress_weight * progress
    }
}

impl ConvergencePolicy for NoveltyConvergence {
    fn evaluate(&self, ctx: &ConvergenceContext<'_>) -> ConvergenceSignal {
        if ctx.rounds_in_phase < ctx.target_rounds {
            return ConvergenceSignal::Continue;
        }
        if self.score(ctx) >= self.weights.threshold {
            ConvergenceSignal::Continue
        } else {
            ConvergenceSignal::Advance
        }
    }
}
