//! Session recovery use case
//!
//! Applies the domain [`RecoveryPolicy`] to a failing operation: waits per
//! the backoff schedule, retries, and compacts first when the context was
//! exceeded. Never fails past its own boundary; the caller always gets a
//! [`RecoveryResult`] describing either the recovered value or a structured
//! failure.

use crate::ports::generation::GatewayError;
use async_trait::async_trait;
use panel_domain::{
    ErrorCategory, ErrorClassifier, RecoveryAttempt, RecoveryOutcome, RecoveryPolicy,
    RecoveryStrategy, SessionFailure,
};
use std::future::Future;
use tracing::{debug, info, warn};

/// An operation that can be retried after a failure.
#[async_trait]
pub trait Retryable: Send {
    type Output: Send;

    /// Run the operation once more.
    async fn attempt(&mut self) -> Result<Self::Output, GatewayError>;

    /// Shrink the context before a retry. Returns whether anything changed;
    /// `false` means compaction is unavailable.
    async fn compact(&mut self) -> bool {
        false
    }
}

/// Adapts a plain retry closure. Has no compaction.
pub struct RetryFn<F>(pub F);

#[async_trait]
impl<F, Fut, T> Retryable for RetryFn<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<T, GatewayError>> + Send,
    T: Send,
{
    type Output = T;

    async fn attempt(&mut self) -> Result<T, GatewayError> {
        (self.0)().await
    }
}

/// Outcome of [`SessionRecovery::recover`].
#[derive(Debug)]
pub struct RecoveryResult<T> {
    /// The value of the first successful retry
    pub value: Option<T>,
    pub attempt: RecoveryAttempt,
    /// Category of the last failure seen (the input category when no retry ran)
    pub final_category: ErrorCategory,
    /// Short, non-technical text; `None` when recovered
    pub user_message: Option<String>,
    pub last_error: Option<GatewayError>,
}

impl<T> RecoveryResult<T> {
    pub fn recovered(&self) -> bool {
        self.attempt.recovered()
    }

    /// Structured failure for an exhausted recovery.
    ///
    /// `original` is the error that started the recovery; the last retry
    /// error takes precedence as the technical detail.
    pub fn to_failure(&self, original: &GatewayError) -> SessionFailure {
        let detail = self
            .last_error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| original.to_string());
        SessionFailure::generation(self.final_category, detail, Some(self.attempt.clone()))
    }
}

/// Classifies gateway errors and drives retries per the recovery policy.
#[derive(Debug, Clone, Default)]
pub struct SessionRecovery {
    policy: RecoveryPolicy,
    classifier: ErrorClassifier,
}

impl SessionRecovery {
    pub fn new(policy: RecoveryPolicy) -> Self {
        Self {
            policy,
            classifier: ErrorClassifier::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn policy(&self) -> &RecoveryPolicy {
        &self.policy
    }

    pub fn classify(&self, error: &GatewayError) -> ErrorCategory {
        error.category_with(&self.classifier)
    }

    /// Recover from a failure of `category` by retrying `target`.
    ///
    /// The failed original call is not counted in `attempts`.
    pub async fn recover<R>(
        &self,
        category: ErrorCategory,
        target: &mut R,
    ) -> RecoveryResult<R::Output>
    where
        R: Retryable + ?Sized,
    {
        let strategy = self.policy.strategy_for(category);
        let budget = self.policy.retry_budget(category);

        if strategy == RecoveryStrategy::NoRetry {
            info!("Not retrying {} error", category);
            return exhausted(category, strategy, 0, category, None);
        }

        if strategy == RecoveryStrategy::CompactThenRetry && !target.compact().await {
            info!("Context exceeded and nothing left to compact");
            return exhausted(category, strategy, 0, category, None);
        }

        let mut attempts = 0;
        let mut final_category = category;
        let mut last_error = None;

        while attempts < budget {
            attempts += 1;

            if strategy != RecoveryStrategy::CompactThenRetry {
                let delay = self.policy.delay_before(attempts);
                if !delay.is_zero() {
                    debug!("Waiting {:?} before retry {}", delay, attempts);
                    tokio::time::sleep(delay).await;
                }
            }

            match target.attempt().await {
                Ok(value) => {
                    info!(
                        "Recovered from {} after {} retr{}",
                        category,
                        attempts,
                        if attempts == 1 { "y" } else { "ies" }
                    );
                    return RecoveryResult {
                        value: Some(value),
                        attempt: RecoveryAttempt {
                            category,
                            attempts,
                            strategy,
                            outcome: RecoveryOutcome::Recovered,
                        },
                        final_category: category,
                        user_message: None,
                        last_error: None,
                    };
                }
                Err(e) => {
                    final_category = self.classify(&e);
                    warn!(
                        "Retry {}/{} failed ({}): {}",
                        attempts, budget, final_category, e
                    );
                    last_error = Some(e);
                    if final_category == ErrorCategory::AuthError {
                        break;
                    }
                }
            }
        }

        exhausted(category, strategy, attempts, final_category, last_error)
    }
}

fn exhausted<T>(
    category: ErrorCategory,
    strategy: RecoveryStrategy,
    attempts: usize,
    final_category: ErrorCategory,
    last_error: Option<GatewayError>,
) -> RecoveryResult<T> {
    RecoveryResult {
        value: None,
        attempt: RecoveryAttempt {
            category,
            attempts,
            strategy,
            outcome: RecoveryOutcome::Exhausted,
        },
        final_category,
        user_message: Some(final_category.user_message().to_string()),
        last_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Pops scripted results; records how often it was called.
    struct Scripted {
        results: VecDeque<Result<&'static str, GatewayError>>,
        calls: usize,
        can_compact: bool,
        compactions: usize,
    }

    impl Scripted {
        fn new(results: Vec<Result<&'static str, GatewayError>>) -> Self {
            Self {
                results: results.into(),
                calls: 0,
                can_compact: false,
                compactions: 0,
            }
        }
    }

    #[async_trait]
    impl Retryable for Scripted {
        type Output = &'static str;

        async fn attempt(&mut self) -> Result<&'static str, GatewayError> {
            self.calls += 1;
            self.results
                .pop_front()
                .unwrap_or(Err(GatewayError::RequestFailed("script exhausted".into())))
        }

        async fn compact(&mut self) -> bool {
            self.compactions += 1;
            self.can_compact
        }
    }

    fn recovery() -> SessionRecovery {
        SessionRecovery::new(RecoveryPolicy::without_delay(3))
    }

    #[tokio::test]
    async fn test_rate_limit_recovers_on_second_attempt() {
        let mut target = Scripted::new(vec![
            Err(GatewayError::RateLimited("429".into())),
            Ok("done"),
        ]);
        let result = recovery().recover(ErrorCategory::RateLimit, &mut target).await;

        assert!(result.recovered());
        assert_eq!(result.attempt.attempts, 2);
        assert_eq!(result.value, Some("done"));
        assert_eq!(result.attempt.strategy, RecoveryStrategy::RetryWithBackoff);
        assert!(result.user_message.is_none());
    }

    #[tokio::test]
    async fn test_auth_error_never_retried() {
        let mut target = Scripted::new(vec![Ok("unused")]);
        let result = recovery().recover(ErrorCategory::AuthError, &mut target).await;

        assert!(!result.recovered());
        assert_eq!(result.attempt.attempts, 0);
        assert_eq!(target.calls, 0);
        assert_eq!(
            result.user_message.as_deref(),
            Some(ErrorCategory::AuthError.user_message())
        );
    }

    #[tokio::test]
    async fn test_transient_exhaustion() {
        let mut target = Scripted::new(vec![
            Err(GatewayError::Timeout),
            Err(GatewayError::Timeout),
            Err(GatewayError::Timeout),
            Ok("too late"),
        ]);
        let result = recovery().recover(ErrorCategory::Timeout, &mut target).await;

        assert!(!result.recovered());
        assert_eq!(result.attempt.attempts, 3);
        assert_eq!(target.calls, 3);
        assert_eq!(result.final_category, ErrorCategory::Timeout);

        let failure = result.to_failure(&GatewayError::Timeout);
        assert_eq!(failure.category(), Some(ErrorCategory::Timeout));
        assert_eq!(failure.recovery.as_ref().map(|r| r.attempts), Some(3));
    }

    #[tokio::test]
    async fn test_auth_failure_during_retry_stops_loop() {
        let mut target = Scripted::new(vec![
            Err(GatewayError::Unauthorized("key revoked".into())),
            Ok("unused"),
        ]);
        let result = recovery().recover(ErrorCategory::NetworkError, &mut target).await;

        assert!(!result.recovered());
        assert_eq!(target.calls, 1);
        assert_eq!(result.final_category, ErrorCategory::AuthError);
    }

    #[tokio::test]
    async fn test_context_exceeded_without_compaction() {
        let mut target = Scripted::new(vec![Ok("unused")]);
        let result = recovery()
            .recover(ErrorCategory::ContextExceeded, &mut target)
            .await;

        assert!(!result.recovered());
        assert_eq!(target.compactions, 1);
        assert_eq!(target.calls, 0);
        assert!(
            result
                .user_message
                .as_deref()
                .is_some_and(|m| m.contains("new session"))
        );
    }

    #[tokio::test]
    async fn test_context_exceeded_compacts_then_retries_once() {
        let mut target = Scripted::new(vec![
            Err(GatewayError::ContextExceeded("still too long".into())),
            Ok("unused"),
        ]);
        target.can_compact = true;
        let result = recovery()
            .recover(ErrorCategory::ContextExceeded, &mut target)
            .await;

        assert!(!result.recovered());
        assert_eq!(target.calls, 1);
        assert_eq!(result.attempt.strategy, RecoveryStrategy::CompactThenRetry);
    }

    #[tokio::test]
    async fn test_unknown_retried_once() {
        let mut target = Scripted::new(vec![
            Err(GatewayError::RequestFailed("mystery".into())),
            Ok("unused"),
        ]);
        let result = recovery().recover(ErrorCategory::Unknown, &mut target).await;

        assert!(!result.recovered());
        assert_eq!(target.calls, 1);
    }

    #[tokio::test]
    async fn test_retry_fn_adapter() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut target = RetryFn(move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(GatewayError::Network("connection reset".into()))
                } else {
                    Ok(42)
                }
            }
        });

        let result = recovery()
            .recover(ErrorCategory::NetworkError, &mut target)
            .await;
        assert_eq!(result.value, Some(42));
        assert_eq!(result.attempt.attempts, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
