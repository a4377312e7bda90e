//! Participant domain
//!
//! Role-specialized discussants, the read-only catalog they live in, and the
//! selector that picks a bounded roster for one discussion.

pub mod catalog;
pub mod entities;
pub mod selector;

pub use catalog::{ParticipantCatalog, PhaseRoster, TopicRule};
pub use entities::{Participant, ParticipantId};
pub use selector::{DEFAULT_MAX_PARTICIPANTS, ParticipantSelector, Selection, SelectionRequest};
