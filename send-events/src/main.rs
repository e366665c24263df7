use anyhow::Result;
use clap::Parser;
use common::config::get_aws_config;
use tracing_subscriber::EnvFilter;

/// Send synthetic events to a Kinesis Stream, Firehose delivery stream, or SQS queue.
#[derive(Parser, Debug)]
#[command(name = "send-events")]
struct Args {
    /// ARN of the destination, e.g. arn:aws:sqs:us-east-1:123456789012:events
    arns: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    println!("send-events");
    let args = Args::parse();

    let line = send_events::send(&args.arns, &mut rand::thread_rng(), |target| async move {
        let aws_config = get_aws_config().await;
        target.sink(&aws_config)
    })
    .await?;
    println!("{line}");

    Ok(())
}
