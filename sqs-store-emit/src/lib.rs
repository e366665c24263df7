use aws_lambda_events::sqs::{BatchItemFailure, SqsMessage};
use common::store::{self, ObjectStore};
use common::{Error, Event, Publisher, Router, compress};
use lambda_runtime::tracing;
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};

#[derive(Debug, Clone)]
pub struct Record {
    message_id: String,
    body: String,
}

impl Record {
    pub fn from_message(message: &SqsMessage) -> Result<Record, Error> {
        Ok(Record {
            message_id: message
                .message_id
                .clone()
                .ok_or(Error::MissingField("SQS message id"))?,
            body: message
                .body
                .clone()
                .ok_or(Error::MissingField("SQS message body"))?,
        })
    }

    fn failure(&self) -> BatchItemFailure {
        BatchItemFailure {
            item_identifier: self.message_id.clone(),
        }
    }
}

pub fn process_messages(messages: &[SqsMessage]) -> Result<Vec<Record>, Error> {
    messages.iter().map(Record::from_message).collect()
}

pub struct Process {
    tasks: JoinSet<Option<BatchItemFailure>>,
    store: Arc<dyn ObjectStore>,
    publisher: Arc<dyn Publisher>,
    router: Arc<Router>,
}

impl Process {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        publisher: Arc<dyn Publisher>,
        router: Arc<Router>,
    ) -> Process {
        Process {
            tasks: JoinSet::new(),
            store,
            publisher,
            router,
        }
    }

    /// Store and emit every record, returning the ones to redeliver.
    pub async fn run(&mut self, records: Vec<Record>) -> Result<Vec<BatchItemFailure>, JoinError> {
        self.start_work(records);

        let mut identifiers = Vec::new();
        while let Some(result) = self.tasks.join_next().await {
            if let Some(failure) = result? {
                identifiers.push(failure);
            }
        }

        Ok(identifiers)
    }

    fn start_work(&mut self, records: Vec<Record>) {
        for record in records {
            let store = Arc::clone(&self.store);
            let publisher = Arc::clone(&self.publisher);
            let router = Arc::clone(&self.router);

            self.tasks.spawn(async move {
                let out =
                    store_and_emit(&record, store.as_ref(), publisher.as_ref(), &router).await;

                match out {
                    Ok(()) => None,
                    Err(err) => {
                        tracing::error!("Failed message {}: {}", record.message_id, err);
                        Some(record.failure())
                    }
                }
            });
        }
    }
}

/// Persist the message before forwarding it; nothing is published unless the
/// object was stored.
async fn store_and_emit(
    record: &Record,
    store: &dyn ObjectStore,
    publisher: &dyn Publisher,
    router: &Router,
) -> Result<(), Error> {
    tracing::info!("Received event {}", record.message_id);
    let event = Event::from_slice(record.body.as_bytes())?;

    let compressed = compress::gzip_message(record.body.as_bytes())?;
    store::store_compressed(store, &store::message_key(&record.message_id), compressed).await?;

    let topic = router.route(&event)?;
    publisher.publish(topic, &record.body).await
}
