use crate::{Error, Event, EventType};

/// Destination topics, one per event type, plus an optional sink for events
/// whose type is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    pub created: String,
    pub updated: String,
    pub deleted: String,
    pub unrecognized: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Router {
    topics: Topics,
}

impl Router {
    pub fn new(topics: Topics) -> Router {
        Router { topics }
    }

    pub fn topic_for(&self, kind: EventType) -> &str {
        match kind {
            EventType::Create => &self.topics.created,
            EventType::Update => &self.topics.updated,
            EventType::Delete => &self.topics.deleted,
        }
    }

    /// Resolve the destination topic of `event`.
    ///
    /// Unrecognized types go to the error sink when one is configured and
    /// fail otherwise.
    pub fn route(&self, event: &Event) -> Result<&str, Error> {
        match event.kind() {
            Ok(kind) => Ok(self.topic_for(kind)),
            Err(err) => self.topics.unrecognized.as_deref().ok_or(err),
        }
    }
}
