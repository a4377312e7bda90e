//! Application-level configuration.
//!
//! - [`DeliberationParams`]: round loop control (phases, ceilings, timeouts)

pub mod deliberation_params;

pub use deliberation_params::DeliberationParams;
