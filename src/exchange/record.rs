//! Immutable exchange records
//!
//! An [`ExchangeRecord`] describes one completed HTTP transaction: the inbound
//! request and the response that was written back for it. Records are built by
//! [`crate::exchange::PendingExchange`] once the response is fully known and
//! are never mutated afterwards; transports serialize them for delivery.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Multi-valued HTTP headers with case-insensitive (lowercased) names.
///
/// Repeated headers keep every value in arrival order. The serialized form is
/// a map of `name -> [values]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, Vec<String>>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot an `http::HeaderMap`, preserving repeated values.
    ///
    /// Header values that are not valid UTF-8 are captured lossily.
    pub fn from_header_map(map: &HeaderMap) -> Self {
        let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in map.iter() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers.entry(name.as_str().to_owned()).or_default().push(value);
        }
        Self(headers)
    }

    /// All values recorded for `name` (lowercased lookup), in arrival order.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.0
            .get(&name.to_ascii_lowercase())
            .map(|values| values.as_slice())
            .unwrap_or(&[])
    }

    /// First value recorded for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

/// The request half of an exchange, snapshotted when processing begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedRequest {
    pub method: String,
    /// Request path including the query string, as received.
    pub path: String,
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "body_encoding")]
    pub body: Option<Bytes>,
    pub timestamp: DateTime<Utc>,
}

/// The response half of an exchange, snapshotted once fully materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedResponse {
    pub status_code: u16,
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "body_encoding")]
    pub body: Option<Bytes>,
    pub timestamp: DateTime<Utc>,
}

/// One completed request/response pair.
///
/// Only constructible through [`crate::exchange::PendingExchange::complete`],
/// which guarantees the response was fully known at build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRecord {
    pub request: RecordedRequest,
    pub response: RecordedResponse,
}

/// Bodies are opaque byte sequences; the wire shape carries them base64-encoded
/// and omits the field entirely when the body is absent.
mod body_encoding {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(body: &Option<Bytes>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match body {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Bytes>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        match encoded {
            Some(encoded) => STANDARD
                .decode(encoded.as_bytes())
                .map(|decoded| Some(Bytes::from(decoded)))
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
