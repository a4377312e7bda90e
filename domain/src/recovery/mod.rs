//! Session recovery
//!
//! Classifies generation failures into typed categories and decides how
//! each category is recovered. The retry loop itself lives in the
//! application layer because it has to wait and call out.

pub mod category;
pub mod classifier;
pub mod failure;
pub mod policy;

pub use category::ErrorCategory;
pub use classifier::{ClassificationRule, ErrorClassifier, classify};
pub use failure::{FailureKind, SessionFailure};
pub use policy::{
    DEFAULT_BACKOFF, DEFAULT_MAX_ATTEMPTS, RecoveryAttempt, RecoveryOutcome, RecoveryPolicy,
    RecoveryStrategy,
};
