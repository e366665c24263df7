use aws_lambda_events::kinesis::KinesisEventRecord;
use common::store::{self, ObjectStore};
use common::{Error, compress};
use lambda_runtime::tracing;

/// Object key of a batch, derived from its first record.
pub fn batch_key(first: &KinesisEventRecord) -> String {
    let event_id = first
        .event_id
        .as_deref()
        .unwrap_or(&first.kinesis.sequence_number);

    store::stream_batch_key(first.kinesis.approximate_arrival_timestamp.0, event_id)
}

/// Gzip all records of the batch into a single object.
/// Returns the stored key, or `None` for an empty batch.
pub async fn store_batch(
    store: &dyn ObjectStore,
    records: &[KinesisEventRecord],
) -> Result<Option<String>, Error> {
    let Some(first) = records.first() else {
        tracing::warn!("Empty Kinesis Stream batch, nothing to store");
        return Ok(None);
    };

    let compressed =
        compress::gzip_records(records.iter().map(|record| record.kinesis.data.as_slice()))?;
    tracing::info!(
        "Compressed {} Kinesis Stream records (original: {} bytes, stored: {} bytes)",
        records.len(),
        compressed.original_size,
        compressed.stored_size()
    );

    let key = batch_key(first);
    store::store_compressed(store, &key, compressed).await?;
    Ok(Some(key))
}
