//! Free-text error classification.
//!
//! An ordered list of `(predicate, category)` rules; the first rule whose
//! predicate matches wins, and nothing matching means `unknown`.

use super::category::ErrorCategory;

/// One classification rule: case-insensitive substring match on any needle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRule {
    pub category: ErrorCategory,
    needles: Vec<String>,
}

impl ClassificationRule {
    pub fn new(category: ErrorCategory, needles: &[&str]) -> Self {
        Self {
            category,
            needles: needles.iter().map(|n| n.to_lowercase()).collect(),
        }
    }

    pub fn matches(&self, lowered: &str) -> bool {
        self.needles.iter().any(|n| lowered.contains(n.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    rules: Vec<ClassificationRule>,
}

impl ErrorClassifier {
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    pub fn classify(&self, error: &str) -> ErrorCategory {
        let lowered = error.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.category)
            .unwrap_or(ErrorCategory::Unknown)
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(vec![
            ClassificationRule::new(
                ErrorCategory::RateLimit,
                &["429", "rate limit", "rate_limit", "too many requests", "quota exceeded"],
            ),
            ClassificationRule::new(
                ErrorCategory::Timeout,
                &["timed out", "timeout", "deadline exceeded"],
            ),
            ClassificationRule::new(
                ErrorCategory::ContextExceeded,
                &[
                    "context length",
                    "context_length",
                    "context window",
                    "maximum context",
                    "too many tokens",
                    "prompt is too long",
                ],
            ),
            ClassificationRule::new(
                ErrorCategory::MalformedResponse,
                &[
                    "invalid json",
                    "unexpected token",
                    "malformed",
                    "failed to parse",
                    "unexpected end of",
                ],
            ),
            ClassificationRule::new(
                ErrorCategory::NetworkError,
                &[
                    "connection",
                    "dns",
                    "reset by peer",
                    "broken pipe",
                    "network unreachable",
                    "host unreachable",
                ],
            ),
            ClassificationRule::new(
                ErrorCategory::AuthError,
                &["401", "403", "unauthorized", "forbidden", "api key", "invalid_api_key"],
            ),
        ])
    }
}

/// Classify with the default rule table.
pub fn classify(error: &str) -> ErrorCategory {
    ErrorClassifier::default().classify(error)
}
