//! Recovery policy: which strategy each error category gets.

use super::category::ErrorCategory;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default backoff schedule between retries.
pub const DEFAULT_BACKOFF: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(5),
];

/// Default number of retries for transient categories.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStrategy {
    /// Retry up to `max_attempts` times, waiting per the backoff schedule
    RetryWithBackoff,
    /// Compact the context, then retry exactly once
    CompactThenRetry,
    /// A single retry after the first backoff delay
    RetryOnce,
    /// Report immediately
    NoRetry,
}

impl RecoveryStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryStrategy::RetryWithBackoff => "retry_with_backoff",
            RecoveryStrategy::CompactThenRetry => "compact_then_retry",
            RecoveryStrategy::RetryOnce => "retry_once",
            RecoveryStrategy::NoRetry => "no_retry",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryOutcome {
    Recovered,
    Exhausted,
}

/// Record of one recovery run, scoped to a single failing operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryAttempt {
    pub category: ErrorCategory,
    /// Number of retries performed (the original failure is not counted)
    pub attempts: usize,
    pub strategy: RecoveryStrategy,
    pub outcome: RecoveryOutcome,
}

impl RecoveryAttempt {
    pub fn recovered(&self) -> bool {
        self.outcome == RecoveryOutcome::Recovered
    }
}

/// Retry limits and backoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryPolicy {
    backoff: Vec<Duration>,
    max_attempts: usize,
}

impl RecoveryPolicy {
    pub fn new(backoff: Vec<Duration>, max_attempts: usize) -> Self {
        Self {
            backoff,
            max_attempts,
        }
    }

    /// Same retry counts, no waiting. Useful for tests and dry runs.
    pub fn without_delay(max_attempts: usize) -> Self {
        Self::new(vec![Duration::ZERO], max_attempts)
    }

    pub fn backoff(&self) -> &[Duration] {
        &self.backoff
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn strategy_for(&self, category: ErrorCategory) -> RecoveryStrategy {
        match category {
            c if c.is_transient() => RecoveryStrategy::RetryWithBackoff,
            ErrorCategory::ContextExceeded => RecoveryStrategy::CompactThenRetry,
            ErrorCategory::Unknown => RecoveryStrategy::RetryOnce,
            _ => RecoveryStrategy::NoRetry,
        }
    }

    /// Maximum retries for `category`.
    pub fn retry_budget(&self, category: ErrorCategory) -> usize {
        match self.strategy_for(category) {
            RecoveryStrategy::RetryWithBackoff => self.max_attempts,
            RecoveryStrategy::CompactThenRetry | RecoveryStrategy::RetryOnce => 1,
            RecoveryStrategy::NoRetry => 0,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    ///
    /// Past the end of the schedule the last delay repeats.
    pub fn delay_before(&self, attempt: usize) -> Duration {
        let index = attempt.saturating_sub(1);
        self.backoff
            .get(index)
            .or_else(|| self.backoff.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.backoff.windows(2).any(|w| w[0] > w[1]) {
            issues.push("recovery: backoff schedule must not decrease".to_string());
        }
        if self.max_attempts > 10 {
            issues.push(format!(
                "recovery: max_attempts ({}) is unreasonably high",
                self.max_attempts
            ));
        }
        issues
    }
}

impl Default for RecoveryPolicy {
    /// Default: 1s, 2s, 5s with at most 3 retries.
    fn default() -> Self {
        Self::new(DEFAULT_BACKOFF.to_vec(), DEFAULT_MAX_ATTEMPTS)
    }
}
