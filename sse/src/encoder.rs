//! Event-stream wire encoding.
//!
//! Each data record is `data: <JSON>\n\n`; a heartbeat is a comment record
//! that conforming clients ignore. serde_json never emits a raw newline, so a
//! body always fits on a single `data:` line.

use crate::message::Event;
use bytes::Bytes;

/// Comment record written for `Event::Heartbeat`.
pub const HEARTBEAT_RECORD: &[u8] = b": heartbeat\n\n";

/// MIME type of the stream.
pub const CONTENT_TYPE: &str = "text/event-stream";

pub fn encode(event: &Event) -> Result<Bytes, serde_json::Error> {
    let body = match event {
        Event::Heartbeat => return Ok(Bytes::from_static(HEARTBEAT_RECORD)),
        Event::Message(body) => serde_json::to_string(body)?,
        _ => serde_json::to_string(event)?,
    };

    Ok(Bytes::from(format!("data: {body}\n\n")))
}
