//! Configuration module.
//!
//! Defines the library configuration struct, CLI-facing enums, and
//! operational constants.

pub mod constants;
pub mod types;

pub use constants::*;
pub use types::{Config, LogFormat, LogLevel};
