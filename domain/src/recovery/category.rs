//! Generation error categories

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Typed category of a generation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    RateLimit,
    Timeout,
    ContextExceeded,
    MalformedResponse,
    NetworkError,
    AuthError,
    Unknown,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 7] = [
        ErrorCategory::RateLimit,
        ErrorCategory::Timeout,
        ErrorCategory::ContextExceeded,
        ErrorCategory::MalformedResponse,
        ErrorCategory::NetworkError,
        ErrorCategory::AuthError,
        ErrorCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::RateLimit => "rate_limit",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::ContextExceeded => "context_exceeded",
            ErrorCategory::MalformedResponse => "malformed_response",
            ErrorCategory::NetworkError => "network_error",
            ErrorCategory::AuthError => "auth_error",
            ErrorCategory::Unknown => "unknown",
        }
    }

    /// Categories that are retried after a backoff delay.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorCategory::RateLimit
                | ErrorCategory::Timeout
                | ErrorCategory::MalformedResponse
                | ErrorCategory::NetworkError
        )
    }

    /// Short, non-technical message shown when recovery gives up.
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCategory::RateLimit => {
                "The AI service is receiving too many requests. Please wait a minute and try again."
            }
            ErrorCategory::Timeout => "The AI service took too long to respond. Please try again.",
            ErrorCategory::ContextExceeded => {
                "This conversation has grown too long to continue. Please start a new session."
            }
            ErrorCategory::MalformedResponse => {
                "The AI service returned a response we could not read. Please try again."
            }
            ErrorCategory::NetworkError => {
                "We could not reach the AI service. Check your connection and try again."
            }
            ErrorCategory::AuthError => {
                "The AI service rejected our credentials. Please check the API key configuration."
            }
            ErrorCategory::Unknown => {
                "Something went wrong while generating a response. Please try again."
            }
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| format!("unknown error category '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_names() {
        for category in ErrorCategory::ALL {
            assert_eq!(category.as_str().parse::<ErrorCategory>().unwrap(), category);
            assert!(!category.user_message().is_empty());
        }
    }

    #[test]
    fn test_transient() {
        assert!(ErrorCategory::RateLimit.is_transient());
        assert!(!ErrorCategory::ContextExceeded.is_transient());
        assert!(!ErrorCategory::AuthError.is_transient());
        assert!(!ErrorCategory::Unknown.is_transient());
    }

    #[test]
    fn test_context_exceeded_asks_for_new_session() {
        assert!(
            ErrorCategory::ContextExceeded
                .user_message()
                .contains("start a new session")
        );
    }
}
