//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod recover_session;
pub mod run_deliberation;
