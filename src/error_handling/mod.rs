//! Error handling module.
//!
//! Defines the error taxonomy used throughout the application and the
//! run-level statistics tracker.

pub mod stats;
pub mod types;

pub use stats::ProcessingStats;
pub use types::{
    DatabaseError, ErrorType, EstimateError, InitializationError, LoadError,
};
