//! GELF serialisation helpers.

use std::{borrow::Cow, collections::BTreeMap, io, sync::Arc, time::UNIX_EPOCH};

use serde::Serialize;

use crate::log_record::{AdditionalField, LogRecord};

/// GELF specification version emitted in every message.
pub const GELF_VERSION: &str = "1.1";
/// Byte terminating each message on a GELF TCP stream.
pub const DELIMITER: u8 = 0;

/// A framed, immutable payload ready for the socket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WirePayload(Arc<[u8]>);

impl WirePayload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for WirePayload {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

fn timestamp_secs(record: &LogRecord) -> f64 {
    let millis = record
        .timestamp
        .duration_since(UNIX_EPOCH)
        .map(|dur| dur.as_millis())
        .unwrap_or_default();
    millis as f64 / 1000.0
}

/// Borrowed GELF view of a [`LogRecord`].
///
/// Every `_` key lives in `extra`, ahead of the fixed keys, and the fixed
/// keys are declared alphabetically, so the document is emitted with sorted
/// keys. An additional field whose prefixed key matches one of the standard
/// `_` keys replaces it.
#[derive(Serialize)]
struct GelfRecord<'a> {
    #[serde(flatten)]
    extra: BTreeMap<String, Cow<'a, AdditionalField>>,
    host: &'a str,
    level: i32,
    short_message: &'a str,
    timestamp: f64,
    version: &'static str,
}

impl<'a> From<&'a LogRecord> for GelfRecord<'a> {
    fn from(record: &'a LogRecord) -> Self {
        let mut extra = BTreeMap::new();
        extra.insert(
            "_process_id".to_owned(),
            Cow::Owned(AdditionalField::Int(i64::from(record.process_id))),
        );
        extra.insert(
            "_process".to_owned(),
            Cow::Owned(AdditionalField::Str(record.process_name.clone())),
        );
        extra.insert(
            "_thread_id".to_owned(),
            Cow::Owned(AdditionalField::Str(record.thread_id.clone())),
        );
        for (key, value) in record.fields.iter() {
            extra.insert(format!("_{key}"), Cow::Borrowed(value));
        }
        Self {
            extra,
            host: &record.host,
            level: i32::from(record.severity),
            short_message: &record.message,
            timestamp: timestamp_secs(record),
            version: GELF_VERSION,
        }
    }
}

/// Serialise a record into a GELF JSON document (without delimiter).
pub fn encode_record(record: &LogRecord) -> io::Result<Vec<u8>> {
    serde_json::to_vec(&GelfRecord::from(record)).map_err(io::Error::other)
}

/// Append the wire delimiter to `payload`.
pub fn frame_payload(payload: impl Into<Vec<u8>>) -> WirePayload {
    let mut framed = payload.into();
    framed.push(DELIMITER);
    WirePayload(Arc::from(framed))
}
