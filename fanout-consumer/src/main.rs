use aws_lambda_events::event::sqs::{SqsBatchResponse, SqsEvent};
use lambda_runtime::tracing;

async fn handle(
    request: lambda_runtime::LambdaEvent<SqsEvent>,
) -> Result<SqsBatchResponse, lambda_runtime::Error> {
    let messages = &request.payload.records;
    tracing::info!("Number of messages received: {}", messages.len());

    let batch_item_failures = fanout_consumer::consume(messages)?;

    Ok(SqsBatchResponse {
        batch_item_failures,
    })
}

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    lambda_runtime::tracing::init_default_subscriber();

    let service_fn = lambda_runtime::service_fn(handle);
    lambda_runtime::run(service_fn).await
}
