use anyhow::Result;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_firehose as firehose;
use aws_sdk_kinesis as kinesis;
use aws_sdk_sqs as sqs;
use aws_sdk_sqs::types::SendMessageBatchRequestEntry;
use common::{Event, EventType};
use itertools::Itertools;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const PERMITS: usize = 20;
pub const SQS_BATCH_LIMIT: usize = 10;
pub const KINESIS_BATCH_LIMIT: usize = 500;
pub const FIREHOSE_BATCH_LIMIT: usize = 500;

const FILLER: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod \
tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud \
exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat. Duis aute irure dolor in \
reprehenderit in voluptate velit esse cillum dolore eu fugiat nulla pariatur. Excepteur sint \
occaecat cupidatat non proident, sunt in culpa qui officia deserunt mollit anim id est laborum.";

#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub body: String,
}

impl Message {
    fn new(index: usize, kind: EventType) -> Result<Message> {
        let id = Self::id();
        let event = Event::new(id.clone(), kind, format!("Message {id}#{index} - {FILLER}"));
        Ok(Message {
            body: event.to_json()?,
            id,
        })
    }

    fn id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Between 100 and 199 events of uniformly random type.
pub fn create_messages<R: Rng>(rng: &mut R) -> Result<Vec<Message>> {
    let count = 100 + rng.gen_range(0..100);

    (0..count)
        .map(|index| {
            let kind = EventType::ALL[rng.gen_range(0..EventType::ALL.len())];
            Message::new(index, kind)
        })
        .collect()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgsError {
    #[error("Missing argument")]
    Missing,
    #[error("Only one argument expected (Kinesis Stream, Firehose, or SQS)")]
    TooMany,
    #[error("Argument must either be a Kinesis Stream, Firehose, or SQS")]
    Unsupported,
    #[error("unexpected format: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    KinesisStream { stream_name: String },
    Firehose { delivery_stream_name: String },
    Sqs { queue_url: String },
}

impl Target {
    pub fn from_args(args: &[String]) -> Result<Target, ArgsError> {
        match args {
            [] => Err(ArgsError::Missing),
            [arn] => Target::parse(arn),
            _ => Err(ArgsError::TooMany),
        }
    }

    pub fn parse(arn: &str) -> Result<Target, ArgsError> {
        if arn.contains(":kinesis:") {
            Ok(Target::KinesisStream {
                stream_name: resource_name(arn)?,
            })
        } else if arn.contains(":firehose:") {
            Ok(Target::Firehose {
                delivery_stream_name: resource_name(arn)?,
            })
        } else if arn.contains(":sqs:") {
            Ok(Target::Sqs {
                queue_url: queue_url(arn)?,
            })
        } else {
            Err(ArgsError::Unsupported)
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Target::KinesisStream { .. } => "Kinesis Stream",
            Target::Firehose { .. } => "Firehose",
            Target::Sqs { .. } => "SQS",
        }
    }

    pub fn sink(&self, aws_config: &SdkConfig) -> Arc<dyn RecordSink> {
        match self.clone() {
            Target::KinesisStream { stream_name } => Arc::new(KinesisSink {
                kinesis_client: kinesis::Client::new(aws_config),
                stream_name,
            }),
            Target::Firehose {
                delivery_stream_name,
            } => Arc::new(FirehoseSink {
                firehose_client: firehose::Client::new(aws_config),
                delivery_stream_name,
            }),
            Target::Sqs { queue_url } => Arc::new(SqsSink {
                sqs_client: sqs::Client::new(aws_config),
                queue_url,
            }),
        }
    }
}

// 'arn:aws:kinesis:us-east-1:123456789012:stream/events' => 'events'
fn resource_name(arn: &str) -> Result<String, ArgsError> {
    arn.split_once('/')
        .map(|(_, name)| name.to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ArgsError::Malformed(arn.to_string()))
}

// 'arn:aws:sqs:us-east-2:123456789012:events'
//  => 'https://sqs.us-east-2.amazonaws.com/123456789012/events'
fn queue_url(arn: &str) -> Result<String, ArgsError> {
    match arn.split(':').collect::<Vec<_>>()[..] {
        ["arn", "aws", "sqs", region, account_id, queue_name] => Ok(format!(
            "https://sqs.{region}.amazonaws.com/{account_id}/{queue_name}"
        )),
        _ => Err(ArgsError::Malformed(arn.to_string())),
    }
}

/// A destination accepting batches of messages.
#[async_trait]
pub trait RecordSink: Send + Sync {
    fn batch_limit(&self) -> usize;

    /// Returns the number of messages accepted.
    async fn send_batch(&self, batch: Vec<Message>) -> Result<usize>;
}

pub struct KinesisSink {
    kinesis_client: kinesis::Client,
    stream_name: String,
}

#[async_trait]
impl RecordSink for KinesisSink {
    fn batch_limit(&self) -> usize {
        KINESIS_BATCH_LIMIT
    }

    async fn send_batch(&self, batch: Vec<Message>) -> Result<usize> {
        let entries = batch
            .into_iter()
            .map(|message| {
                kinesis::types::PutRecordsRequestEntry::builder()
                    .partition_key(message.id)
                    .data(kinesis::primitives::Blob::new(message.body))
                    .build()
                    .map_err(anyhow::Error::from)
            })
            .collect::<Result<Vec<_>>>()?;

        let out = self
            .kinesis_client
            .put_records()
            .stream_name(&self.stream_name)
            .set_records(Some(entries))
            .send()
            .await
            .map_err(|e| e.into_service_error())?;

        Ok(accepted(out.records().iter().map(|entry| entry.error_code())))
    }
}

pub struct FirehoseSink {
    firehose_client: firehose::Client,
    delivery_stream_name: String,
}

#[async_trait]
impl RecordSink for FirehoseSink {
    fn batch_limit(&self) -> usize {
        FIREHOSE_BATCH_LIMIT
    }

    async fn send_batch(&self, batch: Vec<Message>) -> Result<usize> {
        let records = batch
            .into_iter()
            .map(|message| {
                firehose::types::Record::builder()
                    .data(firehose::primitives::Blob::new(message.body + "\n"))
                    .build()
                    .map_err(anyhow::Error::from)
            })
            .collect::<Result<Vec<_>>>()?;

        let out = self
            .firehose_client
            .put_record_batch()
            .delivery_stream_name(&self.delivery_stream_name)
            .set_records(Some(records))
            .send()
            .await
            .map_err(|e| e.into_service_error())?;

        Ok(accepted(out.request_responses().iter().map(|entry| entry.error_code())))
    }
}

pub struct SqsSink {
    sqs_client: sqs::Client,
    queue_url: String,
}

#[async_trait]
impl RecordSink for SqsSink {
    fn batch_limit(&self) -> usize {
        SQS_BATCH_LIMIT
    }

    async fn send_batch(&self, batch: Vec<Message>) -> Result<usize> {
        let entries = batch
            .into_iter()
            .map(|message| {
                SendMessageBatchRequestEntry::builder()
                    .id(message.id)
                    .message_body(message.body)
                    .build()
                    .map_err(anyhow::Error::from)
            })
            .collect::<Result<Vec<_>>>()?;

        let out = self
            .sqs_client
            .send_message_batch()
            .queue_url(&self.queue_url)
            .set_entries(Some(entries))
            .send()
            .await
            .map_err(|e| e.into_service_error())?;

        if !out.failed().is_empty() {
            tracing::warn!("Number of failed messages in batch: {}", out.failed().len());
        }
        Ok(out.successful().len())
    }
}

/// Count the entries without an error code, logging the rejected ones.
fn accepted<'a>(error_codes: impl Iterator<Item = Option<&'a str>>) -> usize {
    let (mut accepted, mut failed) = (0, 0);
    for error_code in error_codes {
        match error_code {
            None => accepted += 1,
            Some(code) => {
                tracing::debug!("Record rejected: {}", code);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        tracing::warn!("Number of failed messages in batch: {}", failed);
    }
    accepted
}

pub struct Process {
    tasks: JoinSet<Result<usize>>,
    semaphore: Arc<Semaphore>,
    sink: Arc<dyn RecordSink>,
}

impl Process {
    pub fn new(sink: Arc<dyn RecordSink>) -> Process {
        Process {
            tasks: JoinSet::new(),
            semaphore: Arc::new(Semaphore::new(PERMITS)),
            sink,
        }
    }

    /// Send all messages in batches no larger than the sink allows and
    /// return how many were accepted.
    pub async fn run(&mut self, messages: Vec<Message>) -> Result<usize> {
        self.start_work(messages).await?;

        let mut sent = 0;
        let mut first_error = None;
        while let Some(result) = self.tasks.join_next().await {
            match result? {
                Ok(accepted) => sent += accepted,
                Err(err) => {
                    tracing::error!("Failed sending batch: {}", err);
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(sent),
        }
    }

    async fn start_work(&mut self, messages: Vec<Message>) -> Result<()> {
        let batches: Vec<Vec<Message>> = messages
            .into_iter()
            .chunks(self.sink.batch_limit())
            .into_iter()
            .map(|chunk| chunk.collect())
            .collect();

        for batch in batches {
            let permit = self.semaphore.clone().acquire_owned().await?;
            let sink = Arc::clone(&self.sink);

            self.tasks.spawn(async move {
                let out = sink.send_batch(batch).await;
                drop(permit);
                out
            });
        }
        Ok(())
    }
}

/// Resolve the destination from `args`, then generate and send the events.
///
/// Returns the line to print. `make_sink` is only called once the destination
/// is valid, so a bad argument never reaches AWS.
pub async fn send<R, F, Fut>(args: &[String], rng: &mut R, make_sink: F) -> Result<String>
where
    R: Rng,
    F: FnOnce(Target) -> Fut,
    Fut: Future<Output = Arc<dyn RecordSink>>,
{
    let target = match Target::from_args(args) {
        Ok(target) => target,
        Err(err @ ArgsError::Malformed(_)) => return Ok(format!("ERROR: {err}")),
        Err(err) => return Ok(err.to_string()),
    };
    let label = target.label();

    let messages = create_messages(rng)?;
    let sent = Process::new(make_sink(target).await).run(messages).await?;
    Ok(format!("SUCCESS: sent {sent} {label} records"))
}
