use aws_lambda_events::event::sqs::{SqsBatchResponse, SqsEvent};
use aws_sdk_s3 as s3;
use aws_sdk_sns as sns;
use common::{ObjectStore, Publisher, Router, S3ObjectStore, SnsPublisher, config};
use lambda_runtime::tracing;
use std::sync::Arc;

struct Clients {
    store: Arc<dyn ObjectStore>,
    publisher: Arc<dyn Publisher>,
    router: Arc<Router>,
}

async fn handle(
    request: lambda_runtime::LambdaEvent<SqsEvent>,
    clients: &Clients,
) -> Result<SqsBatchResponse, lambda_runtime::Error> {
    let messages = &request.payload.records;
    tracing::info!("Number of messages received: {}", messages.len());

    let records = sqs_store_emit::process_messages(messages)?;

    let mut process = sqs_store_emit::Process::new(
        Arc::clone(&clients.store),
        Arc::clone(&clients.publisher),
        Arc::clone(&clients.router),
    );
    let batch_item_failures = process.run(records).await?;
    tracing::info!("Number of failures: {}", batch_item_failures.len());

    Ok(SqsBatchResponse {
        batch_item_failures,
    })
}

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    lambda_runtime::tracing::init_default_subscriber();

    let aws_config = config::get_aws_config().await;
    let clients = Clients {
        store: Arc::new(S3ObjectStore::new(
            s3::Client::new(&aws_config),
            config::get_bucket_name()?,
        )),
        publisher: Arc::new(SnsPublisher::new(sns::Client::new(&aws_config))),
        router: Arc::new(Router::new(config::get_topics()?)),
    };

    let service_fn = lambda_runtime::service_fn(|request| handle(request, &clients));
    lambda_runtime::run(service_fn).await
}
