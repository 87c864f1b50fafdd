//! Initialization of shared resources: logger and HTTP client.

pub mod client;
pub mod logger;

pub use client::init_client;
pub use logger::init_logger_with;
