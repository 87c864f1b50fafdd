//! HTTP client initialization.

use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::{HTTP_TIMEOUT_SECS, USER_AGENT};
use crate::error_handling::InitializationError;

/// Initializes the HTTP client used for the hosting registry lookup.
///
/// The per-request timeout is a coarse upper bound; the resolver applies its
/// own tighter lookup timeout on top.
pub fn init_client() -> Result<reqwest::Client, InitializationError> {
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}
