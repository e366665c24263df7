use anyhow::Result;
use aws_lambda_events::event::kinesis::KinesisEvent;
use aws_sdk_s3 as s3;
use common::{ObjectStore, S3ObjectStore, config};
use lambda_runtime::tracing;

async fn handle(
    request: lambda_runtime::LambdaEvent<KinesisEvent>,
    store: &dyn ObjectStore,
) -> Result<&'static str> {
    let records = request.payload.records;
    tracing::info!("Received {} Kinesis Stream records", records.len());

    kinesis_store::store_batch(store, &records).await?;
    Ok("Ok")
}

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    lambda_runtime::tracing::init_default_subscriber();

    let aws_config = config::get_aws_config().await;
    let store = S3ObjectStore::new(s3::Client::new(&aws_config), config::get_bucket_name()?);

    let service_fn = lambda_runtime::service_fn(|request| handle(request, &store));
    lambda_runtime::run(service_fn).await
}
