use aws_lambda_events::kinesis::KinesisEventRecord;
use aws_lambda_events::streams::{KinesisBatchItemFailure, KinesisEventResponse};
use common::{Error, Publisher, Router, publish};
use lambda_runtime::tracing;
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};

pub struct Process {
    tasks: JoinSet<Option<KinesisBatchItemFailure>>,
    router: Arc<Router>,
    publisher: Arc<dyn Publisher>,
}

impl Process {
    pub fn new(router: Arc<Router>, publisher: Arc<dyn Publisher>) -> Process {
        Process {
            tasks: JoinSet::new(),
            router,
            publisher,
        }
    }

    /// Emit all records concurrently and wait for every one of them.
    /// Records that could not be emitted are reported by sequence number.
    pub async fn run(
        &mut self,
        records: Vec<KinesisEventRecord>,
    ) -> Result<KinesisEventResponse, JoinError> {
        self.start_work(records);

        let mut response = KinesisEventResponse {
            batch_item_failures: Vec::new(),
        };
        while let Some(result) = self.tasks.join_next().await {
            if let Some(failure) = result? {
                response.batch_item_failures.push(failure);
            }
        }

        tracing::info!("Number of failures: {}", response.batch_item_failures.len());
        Ok(response)
    }

    fn start_work(&mut self, records: Vec<KinesisEventRecord>) {
        for record in records {
            let router = Arc::clone(&self.router);
            let publisher = Arc::clone(&self.publisher);

            self.tasks.spawn(async move {
                match emit_record(&router, publisher.as_ref(), &record).await {
                    Ok(()) => None,
                    Err(err) => {
                        tracing::error!(
                            "Failed to emit record {}: {}",
                            record.kinesis.sequence_number,
                            err
                        );
                        Some(failure(record))
                    }
                }
            });
        }
    }
}

async fn emit_record(
    router: &Router,
    publisher: &dyn Publisher,
    record: &KinesisEventRecord,
) -> Result<(), Error> {
    let body = std::str::from_utf8(record.kinesis.data.as_slice())?;
    publish::emit(router, publisher, body).await
}

fn failure(record: KinesisEventRecord) -> KinesisBatchItemFailure {
    KinesisBatchItemFailure {
        item_identifier: Some(record.kinesis.sequence_number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_lambda_events::kinesis::KinesisEvent;
    use base64::{Engine, engine::general_purpose::STANDARD};
    use common::Topics;
    use common::testing::RecordingPublisher;
    use serde_json::json;

    fn router() -> Arc<Router> {
        Arc::new(Router::new(Topics {
            created: "arn:aws:sns:us-east-1:123456789012:ContentCreated".into(),
            updated: "arn:aws:sns:us-east-1:123456789012:ContentUpdated".into(),
            deleted: "arn:aws:sns:us-east-1:123456789012:ContentDeleted".into(),
            unrecognized: None,
        }))
    }

    fn kinesis_event(bodies: &[&str]) -> KinesisEvent {
        let records: Vec<_> = bodies
            .iter()
            .enumerate()
            .map(|(i, body)| {
                json!({
                    "kinesis": {
                        "kinesisSchemaVersion": "1.0",
                        "partitionKey": format!("key-{i}"),
                        "sequenceNumber": format!("4959000000000000000{i}"),
                        "data": STANDARD.encode(body),
                        "approximateArrivalTimestamp": 1709647200.0,
                        "encryptionType": "NONE",
                    },
                    "eventSource": "aws:kinesis",
                    "eventVersion": "1.0",
                    "eventID": format!("shardId-000000000000:4959000000000000000{i}"),
                    "eventName": "aws:kinesis:record",
                    "invokeIdentityArn": "arn:aws:iam::123456789012:role/emit",
                    "awsRegion": "us-east-1",
                    "eventSourceARN": "arn:aws:kinesis:us-east-1:123456789012:stream/events",
                })
            })
            .collect();

        serde_json::from_value(json!({ "Records": records })).unwrap()
    }

    #[tokio::test]
    async fn publishes_each_record_to_its_topic() {
        let publisher = Arc::new(RecordingPublisher::default());
        let bodies = [
            r#"{"Id":"a","EventType":"Create","Message":"first"}"#,
            r#"{"Id":"b","EventType":"Update","Message":"second"}"#,
            r#"{"Id":"c","EventType":"Delete","Message":"third"}"#,
        ];

        let mut process = Process::new(router(), publisher.clone());
        let response = process.run(kinesis_event(&bodies).records).await.unwrap();

        assert!(response.batch_item_failures.is_empty());
        assert_eq!(publisher.published().len(), 3);
        assert_eq!(
            publisher.published_to("arn:aws:sns:us-east-1:123456789012:ContentCreated"),
            vec![bodies[0]]
        );
        assert_eq!(
            publisher.published_to("arn:aws:sns:us-east-1:123456789012:ContentUpdated"),
            vec![bodies[1]]
        );
        assert_eq!(
            publisher.published_to("arn:aws:sns:us-east-1:123456789012:ContentDeleted"),
            vec![bodies[2]]
        );
    }

    #[tokio::test]
    async fn reports_failed_records_without_blocking_others() {
        let publisher = Arc::new(RecordingPublisher::default());
        let bodies = [
            r#"{"Id":"a","EventType":"Create","Message":"first"}"#,
            r#"{"Id":"b","EventType":"Rename","Message":"second"}"#,
            "{ truncated",
        ];

        let mut process = Process::new(router(), publisher.clone());
        let response = process.run(kinesis_event(&bodies).records).await.unwrap();

        let mut failed: Vec<_> = response
            .batch_item_failures
            .into_iter()
            .filter_map(|f| f.item_identifier)
            .collect();
        failed.sort();
        assert_eq!(failed, vec!["49590000000000000001", "49590000000000000002"]);
        assert_eq!(publisher.published().len(), 1);
    }

    #[tokio::test]
    async fn publish_failures_are_reported() {
        let publisher = Arc::new(RecordingPublisher::failing());
        let bodies = [r#"{"Id":"a","EventType":"Delete","Message":"first"}"#];

        let mut process = Process::new(router(), publisher);
        let response = process.run(kinesis_event(&bodies).records).await.unwrap();

        assert_eq!(response.batch_item_failures.len(), 1);
    }

    #[tokio::test]
    async fn failures_serialize_as_partial_batch_response() {
        let publisher = Arc::new(RecordingPublisher::default());
        let bodies = [r#"{"Id":"a","EventType":"Archive","Message":"first"}"#];

        let mut process = Process::new(router(), publisher);
        let response = process.run(kinesis_event(&bodies).records).await.unwrap();

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["batchItemFailures"][0]["itemIdentifier"], "49590000000000000000");
    }
}
