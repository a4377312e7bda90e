//! Infrastructure layer for copilot-panel
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, plus configuration file loading.

pub mod config;
pub mod generation;
pub mod logging;
pub mod store;

// Re-export commonly used types
pub use config::{
    ConfigLoader, FileCatalogConfig, FileConfig, FileContextBudgetConfig, FileConvergenceConfig,
    FileDeliberationConfig, FileGenerationConfig, FileOutputConfig, FileRecoveryConfig,
    ReportFormat,
};
pub use generation::{OpenAiCompatibleGateway, OpenAiSettings};
pub use logging::JsonlEventSink;
pub use store::{InMemorySessionStore, JsonFileSessionArchive};
