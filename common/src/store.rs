use crate::Error;
use crate::compress::Compressed;
use async_trait::async_trait;
use aws_sdk_s3 as s3;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use lambda_runtime::tracing;

/// Write-once object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), Error>;
}

pub struct S3ObjectStore {
    s3_client: s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(s3_client: s3::Client, bucket: String) -> S3ObjectStore {
        S3ObjectStore { s3_client, bucket }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), Error> {
        self.s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/json")
            .content_encoding("gzip")
            .body(ByteStream::from(body))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| Error::Store {
                key: key.to_string(),
                reason: e.into_service_error().to_string(),
            })
    }
}

/// Key of a stream batch: `{year}/{month}/{day}/{hour}/{suffix}.gz`, where
/// `suffix` follows the first `:` of the record's event id.
pub fn stream_batch_key(arrival: DateTime<Utc>, event_id: &str) -> String {
    let suffix = event_id
        .split_once(':')
        .map(|(_, suffix)| suffix)
        .unwrap_or(event_id);

    format!("{}/{}.gz", arrival.format("%Y/%m/%d/%H"), suffix)
}

pub fn message_key(message_id: &str) -> String {
    format!("{message_id}.gz")
}

pub async fn store_compressed(
    store: &dyn ObjectStore,
    key: &str,
    compressed: Compressed,
) -> Result<(), Error> {
    let (original, stored) = (compressed.original_size, compressed.stored_size());
    store.put_object(key, compressed.body).await?;

    tracing::info!(
        "Stored {} (original: {} bytes, stored: {} bytes)",
        key,
        original,
        stored
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::gzip_message;
    use crate::testing::MemoryStore;
    use chrono::TimeZone;

    #[test]
    fn stream_key_uses_arrival_hour_and_event_id_suffix() {
        let arrival = Utc.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap();
        assert_eq!(stream_batch_key(arrival, "abc:123"), "2024/03/05/14/123.gz");
    }

    #[test]
    fn stream_key_splits_on_first_colon_only() {
        let arrival = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(
            stream_batch_key(arrival, "shardId-000000000000:4959:01"),
            "2023/12/31/23/4959:01.gz"
        );
    }

    #[test]
    fn stream_key_without_colon_uses_whole_id() {
        let arrival = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(stream_batch_key(arrival, "4959"), "2024/01/02/03/4959.gz");
    }

    #[test]
    fn message_key_appends_gz() {
        assert_eq!(
            message_key("059f36b4-87a3-44ab-83d2-661975830a7d"),
            "059f36b4-87a3-44ab-83d2-661975830a7d.gz"
        );
    }

    #[tokio::test]
    async fn stores_compressed_body_under_key() {
        let store = MemoryStore::default();
        let compressed = gzip_message(b"payload").unwrap();
        let body = compressed.body.clone();

        store_compressed(&store, "m-1.gz", compressed).await.unwrap();

        assert_eq!(store.objects(), vec![("m-1.gz".to_string(), body)]);
    }
}
