//! Prompt domain
//!
//! Templates for the prompts sent to each participant during a deliberation.

mod template;

pub use template::{PromptTemplate, TurnNotes};
