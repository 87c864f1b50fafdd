//! DevTools protocol wire types.
//!
//! Only the slice of the protocol this crate consumes: the message envelope
//! and the Network/Page events involved in transfer measurement.

use serde::Deserialize;
use serde_json::Value;

/// Envelope of every message the browser sends: either a command response
/// (`id` set) or an event (`method` set).
#[derive(Debug, Deserialize)]
pub(crate) struct IncomingMessage {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<ProtocolError>,
    pub method: Option<String>,
    pub params: Option<Value>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Error object attached to a failed command response.
#[derive(Debug, Deserialize)]
pub(crate) struct ProtocolError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestWillBeSentParams {
    request_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseReceivedParams {
    request_id: String,
    response: ResponsePayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePayload {
    url: String,
    #[serde(default)]
    mime_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadingFinishedParams {
    request_id: String,
    encoded_data_length: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadingFailedParams {
    request_id: String,
}

/// Network-domain events relevant to transfer measurement, in the order they
/// were observed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NetworkEvent {
    /// A request went in flight.
    RequestWillBeSent { request_id: String },
    /// A response was observed: associates the request id with the resolved
    /// URL and content type.
    ResponseReceived {
        request_id: String,
        url: String,
        mime_type: String,
    },
    /// Transfer completed with the final encoded (on-the-wire) byte length.
    LoadingFinished {
        request_id: String,
        encoded_data_length: f64,
    },
    /// The request was canceled or errored; it no longer counts as in
    /// flight.
    LoadingFailed { request_id: String },
}

/// Parses a Network-domain event. Returns `None` for methods this crate does
/// not track or for payloads that do not match the expected shape.
pub(crate) fn parse_network_event(method: &str, params: &Value) -> Option<NetworkEvent> {
    match method {
        "Network.requestWillBeSent" => {
            let p: RequestWillBeSentParams = serde_json::from_value(params.clone()).ok()?;
            Some(NetworkEvent::RequestWillBeSent {
                request_id: p.request_id,
            })
        }
        "Network.responseReceived" => {
            let p: ResponseReceivedParams = serde_json::from_value(params.clone()).ok()?;
            Some(NetworkEvent::ResponseReceived {
                request_id: p.request_id,
                url: p.response.url,
                mime_type: p.response.mime_type,
            })
        }
        "Network.loadingFinished" => {
            let p: LoadingFinishedParams = serde_json::from_value(params.clone()).ok()?;
            Some(NetworkEvent::LoadingFinished {
                request_id: p.request_id,
                encoded_data_length: p.encoded_data_length,
            })
        }
        "Network.loadingFailed" => {
            let p: LoadingFailedParams = serde_json::from_value(params.clone()).ok()?;
            Some(NetworkEvent::LoadingFailed {
                request_id: p.request_id,
            })
        }
        _ => None,
    }
}
