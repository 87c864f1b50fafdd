//! DevTools session driving a single measured page load.
//!
//! One WebSocket connection to the browser endpoint, one attached page
//! target (flat session protocol). Network events are appended to an
//! append-only log as they arrive; the log is consumed into aggregate
//! transfer data only after the load has settled, so deduplication is the
//! consumer's invariant rather than a side effect of listener registration.

use std::collections::HashSet;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::config::{NAVIGATION_WAIT_CEILING, NETWORK_IDLE_WINDOW};
use crate::error_handling::LoadError;

use super::protocol::{self, IncomingMessage, NetworkEvent};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Poll granularity for the quiescence loop. Bounds how far past the idle
/// window or the ceiling a decision can land.
const RECEIVE_SLICE: Duration = Duration::from_millis(100);

pub(crate) struct DevToolsSession {
    sink: WsSink,
    stream: WsStream,
    next_id: u64,
    /// Flat-protocol session id of the attached page target. Commands carry
    /// it once set; events from other sessions are ignored.
    session_id: Option<String>,
    /// Append-only log of observed network events.
    events: Vec<NetworkEvent>,
    /// Requests currently in flight, for quiescence tracking.
    in_flight: HashSet<String>,
    load_fired: bool,
    last_activity: tokio::time::Instant,
}

impl DevToolsSession {
    pub(crate) async fn connect(ws_url: &str) -> Result<Self, LoadError> {
        let (ws, _) = connect_async(ws_url)
            .await
            .map_err(|e| LoadError::Session(format!("WebSocket connect failed: {}", e)))?;
        let (sink, stream) = ws.split();
        Ok(DevToolsSession {
            sink,
            stream,
            next_id: 0,
            session_id: None,
            events: Vec::new(),
            in_flight: HashSet::new(),
            load_fired: false,
            last_activity: tokio::time::Instant::now(),
        })
    }

    pub(crate) fn set_session(&mut self, session_id: String) {
        self.session_id = Some(session_id);
    }

    /// Sends a command and waits for its response. Events arriving in the
    /// meantime are recorded as usual.
    pub(crate) async fn command(&mut self, method: &str, params: Value) -> Result<Value, LoadError> {
        self.next_id += 1;
        let id = self.next_id;
        let mut message = json!({ "id": id, "method": method, "params": params });
        if let Some(session_id) = &self.session_id {
            message["sessionId"] = json!(session_id);
        }
        self.sink
            .send(Message::Text(message.to_string().into()))
            .await
            .map_err(|e| LoadError::Session(format!("WebSocket send failed: {}", e)))?;

        let deadline = tokio::time::Instant::now() + NAVIGATION_WAIT_CEILING;
        loop {
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Err(LoadError::Session(format!(
                    "timed out waiting for response to {}",
                    method
                )));
            }
            let Some(incoming) = self.receive(deadline - now).await? else {
                continue;
            };
            if incoming.id == Some(id) {
                if let Some(error) = incoming.error {
                    return Err(LoadError::Session(format!(
                        "{} failed: {} (code {})",
                        method, error.message, error.code
                    )));
                }
                return Ok(incoming.result.unwrap_or(Value::Null));
            }
            // A response to a stale command id is dropped.
        }
    }

    /// Waits until the page has loaded and the network has been idle for the
    /// configured window, or fails with `QuiescenceTimeout` at the hard
    /// ceiling.
    pub(crate) async fn wait_for_quiescence(&mut self) -> Result<(), LoadError> {
        let start = tokio::time::Instant::now();
        let deadline = start + NAVIGATION_WAIT_CEILING;
        loop {
            if self.load_fired
                && self.in_flight.is_empty()
                && self.last_activity.elapsed() >= NETWORK_IDLE_WINDOW
            {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(LoadError::QuiescenceTimeout(start.elapsed().as_secs_f64()));
            }
            self.receive(RECEIVE_SLICE).await?;
        }
    }

    /// Consumes the append-only event log.
    pub(crate) fn take_events(&mut self) -> Vec<NetworkEvent> {
        std::mem::take(&mut self.events)
    }

    /// Best-effort `Browser.close`. The process-level shutdown is the
    /// backstop, so no response is awaited.
    pub(crate) async fn close(mut self) {
        self.next_id += 1;
        let message = json!({ "id": self.next_id, "method": "Browser.close", "params": {} });
        if let Err(e) = self
            .sink
            .send(Message::Text(message.to_string().into()))
            .await
        {
            log::debug!("Browser.close could not be sent: {}", e);
        }
    }

    /// Receives at most one message within `wait`. Returns `Ok(None)` when
    /// the slice elapsed without a usable message.
    async fn receive(&mut self, wait: Duration) -> Result<Option<IncomingMessage>, LoadError> {
        match tokio::time::timeout(wait, self.stream.next()).await {
            Err(_) => Ok(None),
            Ok(None) => Err(LoadError::Session(
                "WebSocket closed unexpectedly".to_string(),
            )),
            Ok(Some(Err(e))) => Err(LoadError::Session(format!(
                "WebSocket receive failed: {}",
                e
            ))),
            Ok(Some(Ok(Message::Text(text)))) => {
                let incoming: IncomingMessage = serde_json::from_str(&text).map_err(|e| {
                    LoadError::Session(format!("unparseable protocol message: {}", e))
                })?;
                if let Some(method) = incoming.method.clone() {
                    if self.accepts(&incoming.session_id) {
                        let params = incoming.params.clone().unwrap_or(Value::Null);
                        self.handle_event(&method, &params);
                    }
                }
                Ok(Some(incoming))
            }
            // Pings, pongs, and binary frames carry no protocol payload.
            Ok(Some(Ok(_))) => Ok(None),
        }
    }

    /// Whether an event belongs to the attached page session (or to the
    /// browser connection itself before any target is attached).
    fn accepts(&self, event_session: &Option<String>) -> bool {
        match (&self.session_id, event_session) {
            (Some(ours), Some(theirs)) => ours == theirs,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    fn handle_event(&mut self, method: &str, params: &Value) {
        if method == "Page.loadEventFired" {
            self.load_fired = true;
            self.last_activity = tokio::time::Instant::now();
            return;
        }
        let Some(event) = protocol::parse_network_event(method, params) else {
            return;
        };
        match &event {
            NetworkEvent::RequestWillBeSent { request_id } => {
                self.in_flight.insert(request_id.clone());
            }
            NetworkEvent::LoadingFinished { request_id, .. }
            | NetworkEvent::LoadingFailed { request_id } => {
                self.in_flight.remove(request_id);
            }
            NetworkEvent::ResponseReceived { .. } => {}
        }
        self.last_activity = tokio::time::Instant::now();
        self.events.push(event);
    }
}
