//! Network-transfer instrumentation.
//!
//! Drives one isolated headless-browser session per measurement, observes
//! per-resource transfer events over the DevTools protocol, and aggregates
//! them into [`RequestData`]. The browsing context and its process are
//! released on every exit path.

mod browser;
mod protocol;
mod session;
mod transfer;

use std::path::PathBuf;

use serde_json::{json, Value};

use crate::config::Config;
use crate::error_handling::LoadError;

use browser::BrowserProcess;
use protocol::NetworkEvent;
use session::DevToolsSession;

/// A single delivered resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Resolved URL of the resource.
    pub url: String,
    /// Encoded (on-the-wire) bytes delivered for this resource.
    pub transfer_size: u64,
    /// MIME type reported with the response.
    pub mime_type: String,
}

/// Everything observed while loading one page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestData {
    /// Resources in completion order.
    pub resources: Vec<Resource>,
    /// Sum of all resource transfer sizes.
    pub total_transfer_size: u64,
}

/// Instruments page loads. Cheap to construct; each [`record`] call owns its
/// browser for the duration of the measurement.
///
/// [`record`]: ResourceRecorder::record
pub struct ResourceRecorder {
    browser_path: Option<PathBuf>,
}

impl ResourceRecorder {
    pub fn new(config: &Config) -> Self {
        ResourceRecorder {
            browser_path: config.browser_path.clone(),
        }
    }

    /// Measures one cold page load and returns the aggregated transfer data.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] when the browser cannot be launched, the page
    /// cannot be navigated, or the page never settles within the wait
    /// ceiling. The browser process is reaped on every path.
    pub async fn record(&self, url: &str) -> Result<RequestData, LoadError> {
        let binary = browser::resolve_browser_path(self.browser_path.as_deref())?;
        let process = BrowserProcess::launch(&binary).await?;

        let mut session = match DevToolsSession::connect(&process.ws_url).await {
            Ok(session) => session,
            Err(e) => {
                process.shutdown().await;
                return Err(e);
            }
        };

        log::debug!("Measuring {}", url);
        let result = drive_page(&mut session, url).await;

        // Release the session and the process no matter how the load went.
        session.close().await;
        process.shutdown().await;

        let events = result?;
        let data = transfer::collect_request_data(&events);
        log::info!(
            "Measured {}: {} resources, {} bytes transferred",
            url,
            data.resources.len(),
            data.total_transfer_size
        );
        Ok(data)
    }
}

/// Attaches to a fresh page target, navigates, waits for quiescence, and
/// hands back the event log.
async fn drive_page(
    session: &mut DevToolsSession,
    url: &str,
) -> Result<Vec<NetworkEvent>, LoadError> {
    let target = session
        .command("Target.createTarget", json!({ "url": "about:blank" }))
        .await?;
    let target_id = required_str(&target, "targetId", "Target.createTarget")?;

    let attached = session
        .command(
            "Target.attachToTarget",
            json!({ "targetId": target_id, "flatten": true }),
        )
        .await?;
    let session_id = required_str(&attached, "sessionId", "Target.attachToTarget")?;
    session.set_session(session_id);

    session.command("Network.enable", json!({})).await?;
    session.command("Page.enable", json!({})).await?;

    let navigation = session
        .command("Page.navigate", json!({ "url": url }))
        .await?;
    if let Some(error_text) = navigation.get("errorText").and_then(Value::as_str) {
        if !error_text.is_empty() {
            return Err(LoadError::Navigation {
                url: url.to_string(),
                reason: error_text.to_string(),
            });
        }
    }

    session.wait_for_quiescence().await?;
    Ok(session.take_events())
}

fn required_str(result: &Value, field: &str, method: &str) -> Result<String, LoadError> {
    result
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| LoadError::Session(format!("{} returned no {}", method, field)))
}
