//! Synthesis of a finished deliberation into a structured report

pub mod report;

pub use report::{ActionItem, ReportGenerator, SynthesisReport};
