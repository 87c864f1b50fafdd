//! Green hosting resolution.
//!
//! Asks the Green Web Foundation registry whether a host's infrastructure
//! runs on renewable energy. The outcome is tri-state: `Some(green)`,
//! `Some(non-green)`, or `None` when the lookup timed out or failed.
//! "Unknown" is distinct from "non-green"; the estimator treats it as
//! "no discount, status unreported".

use std::time::Duration;

use serde::Deserialize;

use crate::config::{GREENCHECK_ENDPOINT, HOSTING_LOOKUP_TIMEOUT};

/// Hosting status for a single host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostingStatus {
    pub green: bool,
}

#[derive(Debug, Deserialize)]
struct GreencheckResponse {
    green: bool,
}

/// Resolves green-hosting status with timeout and override support.
pub struct GreenHostingResolver {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl GreenHostingResolver {
    pub fn new(client: reqwest::Client) -> Self {
        GreenHostingResolver {
            client,
            endpoint: GREENCHECK_ENDPOINT.to_string(),
            timeout: HOSTING_LOOKUP_TIMEOUT,
        }
    }

    /// Overrides the registry endpoint. Used by tests.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Resolves the hosting status for `url`.
    ///
    /// When an explicit hosting factor is supplied the answer is derived
    /// synchronously (a factor of exactly 1 means green, anything else
    /// non-green) and no external lookup happens. Otherwise the registry is
    /// queried by host with a bounded timeout; any timeout, transport, or
    /// parse failure yields `None` (unknown).
    pub async fn resolve(
        &self,
        url: &str,
        override_factor: Option<f64>,
    ) -> Option<HostingStatus> {
        if let Some(factor) = override_factor {
            return Some(HostingStatus {
                green: factor == 1.0,
            });
        }

        let host = lookup_host(url)?;
        let request = self
            .client
            .get(format!("{}/{}", self.endpoint, host))
            .send();

        let response = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                log::warn!("Hosting lookup for {} failed: {}", host, e);
                return None;
            }
            Err(_) => {
                log::warn!(
                    "Hosting lookup for {} timed out after {:?}",
                    host,
                    self.timeout
                );
                return None;
            }
        };

        match tokio::time::timeout(self.timeout, response.json::<GreencheckResponse>()).await {
            Ok(Ok(body)) => {
                log::debug!("Hosting status for {}: green={}", host, body.green);
                Some(HostingStatus { green: body.green })
            }
            Ok(Err(e)) => {
                log::warn!("Hosting lookup for {} returned unparseable body: {}", host, e);
                None
            }
            Err(_) => {
                log::warn!("Hosting lookup for {} timed out reading body", host);
                None
            }
        }
    }
}

/// Extracts the hostname used for the registry lookup, with a leading
/// `www.` stripped.
fn lookup_host(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}
