//! Presentation layer for copilot-panel
//!
//! This crate contains CLI definitions, output formatters and progress
//! reporters.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{
    BudgetArgs, ClassifyArgs, Cli, Command, OutputFormat, RunArgs, SelectArgs, parse_risk_factor,
};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{ProgressReporter, StreamingProgress};
