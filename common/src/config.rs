use crate::Topics;
use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, SdkConfig, retry::RetryConfig};

pub const CREATED_TOPIC_VAR: &str = "CONTENT_CREATED_TOPIC_ARN";
pub const UPDATED_TOPIC_VAR: &str = "CONTENT_UPDATED_TOPIC_ARN";
pub const DELETED_TOPIC_VAR: &str = "CONTENT_DELETED_TOPIC_ARN";
pub const UNRECOGNIZED_TOPIC_VAR: &str = "UNRECOGNIZED_EVENT_TOPIC_ARN";
pub const BUCKET_VAR: &str = "BUCKET_NAME";

pub async fn get_aws_config() -> SdkConfig {
    let version = BehaviorVersion::v2025_01_17();
    let retry_config = RetryConfig::standard();

    aws_config::defaults(version)
        .retry_config(retry_config)
        .load()
        .await
}

fn require(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be configured"))
}

pub fn get_topics() -> Result<Topics> {
    Ok(Topics {
        created: require(CREATED_TOPIC_VAR)?,
        updated: require(UPDATED_TOPIC_VAR)?,
        deleted: require(DELETED_TOPIC_VAR)?,
        unrecognized: std::env::var(UNRECOGNIZED_TOPIC_VAR)
            .ok()
            .filter(|arn| !arn.is_empty()),
    })
}

pub fn get_bucket_name() -> Result<String> {
    Ok(bucket_name(&require(BUCKET_VAR)?).to_string())
}

/// Accepts a bare bucket name or an S3 bucket ARN (`arn:aws:s3:::name`).
pub fn bucket_name(value: &str) -> &str {
    value
        .strip_prefix("arn:")
        .and_then(|arn| arn.rsplit_once(":::"))
        .map(|(_, name)| name)
        .unwrap_or(value)
}
