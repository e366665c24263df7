//! In-memory stand-ins for SNS and S3, recording every call.

use crate::{Error, ObjectStore, Publisher};
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn failing() -> RecordingPublisher {
        RecordingPublisher {
            fail: true,
            ..Default::default()
        }
    }

    /// `(topic, message)` pairs in call order.
    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    pub fn published_to(&self, topic: &str) -> Vec<String> {
        self.published()
            .into_iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, message)| message)
            .collect()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, topic_arn: &str, message: &str) -> Result<(), Error> {
        if self.fail {
            return Err(Error::Publish {
                topic: topic_arn.to_string(),
                reason: "publish disabled".to_string(),
            });
        }
        self.published
            .lock()
            .unwrap()
            .push((topic_arn.to_string(), message.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<Vec<(String, Vec<u8>)>>,
    fail: bool,
}

impl MemoryStore {
    pub fn failing() -> MemoryStore {
        MemoryStore {
            fail: true,
            ..Default::default()
        }
    }

    pub fn objects(&self) -> Vec<(String, Vec<u8>)> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), Error> {
        if self.fail {
            return Err(Error::Store {
                key: key.to_string(),
                reason: "store disabled".to_string(),
            });
        }
        self.objects.lock().unwrap().push((key.to_string(), body));
        Ok(())
    }
}
