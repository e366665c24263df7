use anyhow::Result;
use aws_lambda_events::event::firehose::{KinesisFirehoseEvent, KinesisFirehoseResponse};
use aws_sdk_sns as sns;
use common::{Publisher, Router, SnsPublisher, config};
use lambda_runtime::tracing;
use std::sync::Arc;

async fn handle(
    request: lambda_runtime::LambdaEvent<KinesisFirehoseEvent>,
    router: &Arc<Router>,
    publisher: &Arc<dyn Publisher>,
) -> Result<KinesisFirehoseResponse> {
    let records = request.payload.records;
    tracing::info!("Received {} Firehose records", records.len());

    let mut process = firehose_emit::Process::new(Arc::clone(router), Arc::clone(publisher));
    Ok(process.run(records).await?)
}

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    lambda_runtime::tracing::init_default_subscriber();

    let aws_config = config::get_aws_config().await;
    let router = Arc::new(Router::new(config::get_topics()?));
    let publisher: Arc<dyn Publisher> = Arc::new(SnsPublisher::new(sns::Client::new(&aws_config)));

    let service_fn = lambda_runtime::service_fn(|request| handle(request, &router, &publisher));
    lambda_runtime::run(service_fn).await
}
