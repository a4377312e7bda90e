//! Task continuation tracking
//!
//! Obligations are extracted from requirement text and from participant
//! output. A session may only conclude once every obligation is completed
//! or dropped.

pub mod entities;
pub mod extractor;
pub mod tracker;

pub use entities::{TodoAnchor, TodoItem, TodoSource, TodoStatus};
pub use extractor::{Resolution, extract_marked, extract_requirements, extract_resolutions};
pub use tracker::{StopCheck, TodoTracker};
