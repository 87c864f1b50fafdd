//! Aggregation of the network event log into transfer data.
//!
//! The consumer enforces the invariants the instrumentation promises:
//! every resource counted exactly once by request identifier, orphaned
//! finish events ignored, and the total always equal to the sum of the
//! parts.

use std::collections::HashMap;

use super::protocol::NetworkEvent;
use super::{RequestData, Resource};

/// Folds an ordered event log into [`RequestData`].
///
/// - A finish event without a prior response record for the same request id
///   is dropped (the protocol emits these for canceled requests).
/// - Duplicate finish events for one request id count once; the first wins.
/// - When a redirect chain reuses a request id, the last observed response
///   describes the resource actually delivered.
pub(crate) fn collect_request_data(events: &[NetworkEvent]) -> RequestData {
    struct ResponseMeta<'a> {
        url: &'a str,
        mime_type: &'a str,
    }

    let mut responses: HashMap<&str, ResponseMeta<'_>> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    let mut sizes: HashMap<&str, u64> = HashMap::new();

    for event in events {
        match event {
            NetworkEvent::ResponseReceived {
                request_id,
                url,
                mime_type,
            } => {
                responses.insert(request_id, ResponseMeta { url, mime_type });
            }
            NetworkEvent::LoadingFinished {
                request_id,
                encoded_data_length,
            } => {
                if !responses.contains_key(request_id.as_str()) {
                    log::debug!("Ignoring orphaned finish event for request {}", request_id);
                    continue;
                }
                if sizes.contains_key(request_id.as_str()) {
                    continue;
                }
                order.push(request_id);
                sizes.insert(request_id, encoded_length_to_bytes(*encoded_data_length));
            }
            NetworkEvent::RequestWillBeSent { .. } | NetworkEvent::LoadingFailed { .. } => {}
        }
    }

    let resources: Vec<Resource> = order
        .iter()
        .map(|id| {
            let meta = &responses[*id];
            Resource {
                url: meta.url.to_string(),
                transfer_size: sizes[*id],
                mime_type: meta.mime_type.to_string(),
            }
        })
        .collect();
    let total_transfer_size = resources.iter().map(|r| r.transfer_size).sum();

    RequestData {
        resources,
        total_transfer_size,
    }
}

/// The protocol reports encoded lengths as floating point; a canceled or
/// cached response can report -1.
fn encoded_length_to_bytes(encoded: f64) -> u64 {
    if encoded.is_finite() && encoded > 0.0 {
        encoded.round() as u64
    } else {
        0
    }
}
