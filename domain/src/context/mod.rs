//! Context budget management
//!
//! - [`ContextBudget`] measures how full the working window is
//! - [`WorkingWindow`] is the compactable view sent to the generation capability
//!
//! # Example
//!
//! ```
//! use panel_domain::context::{ContextBudget, ContextStatus};
//!
//! let budget = ContextBudget::new(1000);
//! assert_eq!(budget.check(699).status, ContextStatus::Ok);
//! assert_eq!(budget.check(720).status, ContextStatus::Warn);
//! assert_eq!(budget.check(900).status, ContextStatus::Compact);
//! assert_eq!(budget.check(960).status, ContextStatus::EmergencyCompact);
//! ```

pub mod context_budget;
pub mod working_window;

pub use context_budget::{
    BudgetThresholds, ContextBudget, ContextStatus, ContextUsage, DEFAULT_BUDGET_UNITS,
};
pub use working_window::{
    CompactionLevel, CompactionReport, SummaryEntry, WindowEntry, WorkingWindow,
};
