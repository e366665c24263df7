use aws_lambda_events::firehose::{
    KinesisFirehoseEventRecord, KinesisFirehoseResponse, KinesisFirehoseResponseRecord,
    KinesisFirehoseResponseRecordMetadata,
};
use common::{Error, Publisher, Router, publish};
use lambda_runtime::tracing;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};

pub const TRANSFORMED_STATE_OK: &str = "Ok";
pub const TRANSFORMED_STATE_PROCESSING_FAILED: &str = "ProcessingFailed";

pub struct Process {
    tasks: JoinSet<(usize, KinesisFirehoseResponseRecord)>,
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

    /// Emit every record and acknowledge each one, in input order.
    pub async fn run(
        &mut self,
        records: Vec<KinesisFirehoseEventRecord>,
    ) -> Result<KinesisFirehoseResponse, JoinError> {
        self.start_work(records);

        let mut acks = Vec::with_capacity(self.tasks.len());
        while let Some(result) = self.tasks.join_next().await {
            acks.push(result?);
        }
        acks.sort_by_key(|(index, _)| *index);

        let failed = acks
            .iter()
            .filter(|(_, ack)| ack.result.as_deref() != Some(TRANSFORMED_STATE_OK))
            .count();
        tracing::info!("Number of records failed: {}", failed);

        Ok(KinesisFirehoseResponse {
            records: acks.into_iter().map(|(_, ack)| ack).collect(),
        })
    }

    fn start_work(&mut self, records: Vec<KinesisFirehoseEventRecord>) {
        for (index, record) in records.into_iter().enumerate() {
            let router = Arc::clone(&self.router);
            let publisher = Arc::clone(&self.publisher);

            self.tasks.spawn(async move {
                let result = match emit_record(&router, publisher.as_ref(), &record).await {
                    Ok(()) => TRANSFORMED_STATE_OK,
                    Err(err) => {
                        tracing::error!("Failed to emit record {:?}: {}", record.record_id, err);
                        TRANSFORMED_STATE_PROCESSING_FAILED
                    }
                };
                (index, acknowledge(record, result))
            });
        }
    }
}

async fn emit_record(
    router: &Router,
    publisher: &dyn Publisher,
    record: &KinesisFirehoseEventRecord,
) -> Result<(), Error> {
    let body = std::str::from_utf8(record.data.as_slice())?;
    publish::emit(router, publisher, body).await
}

fn acknowledge(record: KinesisFirehoseEventRecord, result: &str) -> KinesisFirehoseResponseRecord {
    KinesisFirehoseResponseRecord {
        record_id: record.record_id,
        result: Some(result.to_string()),
        data: record.data,
        metadata: KinesisFirehoseResponseRecordMetadata {
            partition_keys: HashMap::new(),
        },
    }
}
