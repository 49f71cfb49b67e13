use std::collections::BTreeMap;

use serde::Serialize;

/// Header data describing an open stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamMetadata {
    /// Streams have no timeout of their own; always false.
    pub timed_out: bool,
    /// Operations block until complete; always true.
    pub blocked: bool,
    /// The stream's end-of-stream indicator.
    pub eof: bool,
    /// `"plainfile"` for filesystem targets, `"memory"` for pseudo-targets.
    pub wrapper_type: &'static str,
    /// `"file"`, `"memory"` or `"temp"`.
    pub stream_type: &'static str,
    pub mode: String,
    /// Bytes buffered by the stream layer itself; it does not buffer.
    pub unread_bytes: u64,
    pub seekable: bool,
    pub uri: String,
    /// Whether a temporary stream has migrated its content to disk.
    pub spilled: bool,
}

impl StreamMetadata {
    /// The metadata as a string-keyed mapping.
    pub fn to_map(&self) -> BTreeMap<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        }
    }
}
