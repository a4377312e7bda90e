//! Structured failure surfaced when a session is aborted.

use super::category::ErrorCategory;
use super::policy::RecoveryAttempt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "category")]
pub enum FailureKind {
    Generation(ErrorCategory),
    Cancelled,
    /// The session reached a state it cannot continue from
    Internal,
}

/// The single failure reported for an aborted session.
///
/// Individual retries are never surfaced; `recovery` describes them as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFailure {
    pub kind: FailureKind,
    /// Short, non-technical text for end users
    pub user_message: String,
    /// Technical detail for diagnostic logging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery: Option<RecoveryAttempt>,
}

impl SessionFailure {
    pub fn generation(
        category: ErrorCategory,
        detail: impl Into<String>,
        recovery: Option<RecoveryAttempt>,
    ) -> Self {
        Self {
            kind: FailureKind::Generation(category),
            user_message: category.user_message().to_string(),
            detail: Some(detail.into()),
            recovery,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            kind: FailureKind::Cancelled,
            user_message: "The deliberation was cancelled.".to_string(),
            detail: None,
            recovery: None,
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Internal,
            user_message: "The deliberation stopped unexpectedly. Please try again.".to_string(),
            detail: Some(detail.into()),
            recovery: None,
        }
    }

    pub fn category(&self) -> Option<ErrorCategory> {
        match self.kind {
            FailureKind::Generation(c) => Some(c),
            FailureKind::Cancelled | FailureKind::Internal => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_failure_uses_category_message() {
        let failure = SessionFailure::generation(ErrorCategory::AuthError, "HTTP 401", None);
        assert_eq!(failure.category(), Some(ErrorCategory::AuthError));
        assert_eq!(failure.user_message, ErrorCategory::AuthError.user_message());
        assert_eq!(failure.detail.as_deref(), Some("HTTP 401"));

        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["kind"]["kind"], "generation");
        assert_eq!(json["kind"]["category"], "auth_error");
    }

    #[test]
    fn test_cancelled() {
        let failure = SessionFailure::cancelled();
        assert_eq!(failure.category(), None);
        assert_eq!(failure.kind, FailureKind::Cancelled);
    }

    #[test]
    fn test_internal_keeps_detail_out_of_user_message() {
        let failure = SessionFailure::internal("cannot append to an aborted session");
        assert_eq!(failure.category(), None);
        assert!(!failure.user_message.contains("aborted session"));
        assert_eq!(
            failure.detail.as_deref(),
            Some("cannot append to an aborted session")
        );

        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["kind"]["kind"], "internal");
    }
}
