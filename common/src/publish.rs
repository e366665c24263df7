use crate::{Error, Event, Router};
use async_trait::async_trait;
use aws_sdk_sns as sns;
use lambda_runtime::tracing;

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic_arn: &str, message: &str) -> Result<(), Error>;
}

pub struct SnsPublisher {
    sns_client: sns::Client,
}

impl SnsPublisher {
    pub fn new(sns_client: sns::Client) -> SnsPublisher {
        SnsPublisher { sns_client }
    }
}

#[async_trait]
impl Publisher for SnsPublisher {
    async fn publish(&self, topic_arn: &str, message: &str) -> Result<(), Error> {
        self.sns_client
            .publish()
            .topic_arn(topic_arn)
            .message(message)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| Error::Publish {
                topic: topic_arn.to_string(),
                reason: e.into_service_error().to_string(),
            })
    }
}

/// Route the serialized event in `body` and publish it unmodified.
pub async fn emit(router: &Router, publisher: &dyn Publisher, body: &str) -> Result<(), Error> {
    let event: Event = serde_json::from_str(body)?;
    let topic = router.route(&event)?;

    publisher.publish(topic, body).await?;
    tracing::debug!("Emitted {} event {} to {}", event.event_type, event.id, topic);
    Ok(())
}
