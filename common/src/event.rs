use crate::Error;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of change carried by an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Create,
    Update,
    Delete,
}

impl EventType {
    pub const ALL: [EventType; 3] = [EventType::Create, EventType::Update, EventType::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Create => "Create",
            EventType::Update => "Update",
            EventType::Delete => "Delete",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Create" => Ok(EventType::Create),
            "Update" => Ok(EventType::Update),
            "Delete" => Ok(EventType::Delete),
            other => Err(Error::UnrecognizedEventType(other.to_string())),
        }
    }
}

/// The domain payload moved between services, serialized as flat JSON.
///
/// `event_type` is kept as received so that an unrecognized value can still
/// be routed to an error sink; use [`Event::kind`] to interpret it. Missing or
/// null fields decode as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub event_type: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Event {
    pub fn new(id: impl Into<String>, kind: EventType, message: impl Into<String>) -> Event {
        Event {
            id: id.into(),
            event_type: kind.to_string(),
            message: message.into(),
        }
    }

    pub fn from_slice(data: &[u8]) -> Result<Event, Error> {
        Ok(serde_json::from_slice(data)?)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn kind(&self) -> Result<EventType, Error> {
        self.event_type.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_pascal_case_fields() {
        let event = Event::new("42", EventType::Update, "hello");
        assert_eq!(
            event.to_json().unwrap(),
            r#"{"Id":"42","EventType":"Update","Message":"hello"}"#
        );
    }

    #[test]
    fn keeps_unknown_event_type_until_interpreted() {
        let event =
            Event::from_slice(br#"{"Id":"1","EventType":"Archive","Message":"m"}"#).unwrap();
        assert_eq!(event.event_type, "Archive");

        let err = event.kind().unwrap_err();
        assert_eq!(err.to_string(), "Unrecognized event type: 'Archive'");
    }

    #[test]
    fn event_type_parsing_is_case_sensitive() {
        assert_eq!("Delete".parse::<EventType>().unwrap(), EventType::Delete);
        assert!("delete".parse::<EventType>().is_err());
    }

    #[test]
    fn missing_or_null_fields_decode_as_empty() {
        let event = Event::from_slice(br#"{"Id":null,"EventType":"Create"}"#).unwrap();

        assert_eq!(event.id, "");
        assert_eq!(event.message, "");
        assert_eq!(event.kind().unwrap(), EventType::Create);
    }

    #[test]
    fn missing_event_type_is_unrecognized() {
        let event = Event::from_slice(br#"{"Id":"1","Message":"m"}"#).unwrap();

        assert!(matches!(event.kind(), Err(Error::UnrecognizedEventType(t)) if t.is_empty()));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Event::from_slice(b"not json").unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(_)));
    }
}
