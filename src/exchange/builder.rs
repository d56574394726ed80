//! Pending exchange state for a single in-flight request.
//!
//! [`PendingExchange::begin`] snapshots the inbound request at the moment the
//! server starts processing it; [`PendingExchange::complete`] consumes the
//! pending state exactly once, after the full response is materialized, and
//! yields the immutable [`ExchangeRecord`]. Both steps are infallible so the
//! capture path can never interfere with response delivery.

use bytes::Bytes;
use chrono::Utc;
use http::{request, response};

use super::record::{ExchangeRecord, Headers, RecordedRequest, RecordedResponse};

/// Request snapshot awaiting its response.
///
/// Owned by the request's own future for the lifetime of one exchange; there
/// is no cross-request registry.
#[derive(Debug)]
pub struct PendingExchange {
    request: RecordedRequest,
}

impl PendingExchange {
    /// Snapshot the inbound request.
    ///
    /// `body` is the already-buffered copy of the request body; the original
    /// bytes are handed onward to the application handler untouched. A
    /// zero-length capture is recorded as an absent body.
    pub fn begin(parts: &request::Parts, body: Bytes) -> Self {
        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_owned())
            .unwrap_or_else(|| parts.uri.path().to_owned());

        Self {
            request: RecordedRequest {
                method: parts.method.as_str().to_owned(),
                path,
                headers: Headers::from_header_map(&parts.headers),
                body: non_empty(body),
                timestamp: Utc::now(),
            },
        }
    }

    /// Finalize the exchange once the full response is known.
    ///
    /// Consumes the pending state, so a record is built at most once per
    /// request.
    pub fn complete(self, parts: &response::Parts, body: Bytes) -> ExchangeRecord {
        ExchangeRecord {
            request: self.request,
            response: RecordedResponse {
                status_code: parts.status.as_u16(),
                headers: Headers::from_header_map(&parts.headers),
                body: non_empty(body),
                timestamp: Utc::now(),
            },
        }
    }
}

fn non_empty(body: Bytes) -> Option<Bytes> {
    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}
