use domain::error::{Error as DomainError, FailureCategory};
use domain::Reading;
use serde::Serialize;
use serde_json::Value;

/// Trait for getting the event type name, used in logs
pub trait EventType {
    fn event_type(&self) -> &'static str;
}

/// Value of the `msg` field of an error event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCategory {
    #[serde(rename = "fetch_failed")]
    UpstreamUnavailable,
    #[serde(rename = "internal_error")]
    InternalFault,
}

impl From<FailureCategory> for ErrorCategory {
    fn from(category: FailureCategory) -> Self {
        match category {
            FailureCategory::UpstreamUnavailable => ErrorCategory::UpstreamUnavailable,
            FailureCategory::InternalFault => ErrorCategory::InternalFault,
        }
    }
}

/// Everything a session can put on the wire.
///
/// `Message` and `Heartbeat` are not serialized through this type: a message
/// body is written verbatim and a heartbeat carries no JSON at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "connected")]
    Connected {
        #[serde(skip_serializing_if = "Option::is_none")]
        lat: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        lon: Option<f64>,
    },
    #[serde(rename = "weather")]
    Reading(Reading),
    #[serde(rename = "error")]
    Error { msg: ErrorCategory, detail: String },
    #[serde(skip_serializing)]
    Message(Value),
    #[serde(skip_serializing)]
    Heartbeat,
}

impl Event {
    /// Handshake for a location based session.
    pub fn connected(lat: f64, lon: f64) -> Self {
        Event::Connected {
            lat: Some(lat),
            lon: Some(lon),
        }
    }

    /// Handshake for a session with no location, such as a campaign replay.
    pub fn connected_without_location() -> Self {
        Event::Connected {
            lat: None,
            lon: None,
        }
    }

    pub fn failure(err: &DomainError) -> Self {
        Event::Error {
            msg: err.category().into(),
            detail: err.detail(),
        }
    }
}

impl EventType for Event {
    fn event_type(&self) -> &'static str {
        match self {
            Event::Connected { .. } => "connected",
            Event::Reading(_) => "weather",
            Event::Error { .. } => "error",
            Event::Message(_) => "message",
            Event::Heartbeat => "heartbeat",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::error::{ExternalErrorKind, InternalErrorKind};
    use serde_json::json;

    #[test]
    fn test_connected_serializes_coordinates() {
        let value = serde_json::to_value(Event::connected(51.5, -0.1)).unwrap();
        assert_eq!(value, json!({ "type": "connected", "lat": 51.5, "lon": -0.1 }));
    }

    #[test]
    fn test_connected_without_location_omits_coordinates() {
        let value = serde_json::to_value(Event::connected_without_location()).unwrap();
        assert_eq!(value, json!({ "type": "connected" }));
    }

    #[test]
    fn test_failure_maps_categories_to_msg() {
        let upstream = Event::failure(&DomainError::external(ExternalErrorKind::Timeout));
        let internal = Event::failure(&DomainError::internal(InternalErrorKind::Decode));

        assert_eq!(
            serde_json::to_value(upstream).unwrap(),
            json!({ "type": "error", "msg": "fetch_failed", "detail": "upstream request timed out" })
        );
        assert_eq!(
            serde_json::to_value(internal).unwrap()["msg"],
            "internal_error"
        );
    }

    #[test]
    fn test_event_type_names() {
        assert_eq!(Event::Heartbeat.event_type(), "heartbeat");
        assert_eq!(Event::Message(json!({})).event_type(), "message");
        assert_eq!(Event::connected(0.0, 0.0).event_type(), "connected");
    }
}
