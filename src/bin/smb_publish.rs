//! Publish a single message
//!
//! Run with: smb-publish HOST TOPIC/SUBTOPIC MESSAGE

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use smb_rs::protocol::constants::DEFAULT_BROKER_PORT;
use smb_rs::{Publisher, PublisherConfig, TopicName};

#[derive(Parser)]
#[command(version, about = "Publish a message to an smb broker")]
struct Args {
    /// Broker hostname or address
    host: String,

    /// Topic name, TOPIC/SUBTOPIC (no wildcards)
    topic: String,

    /// Message text
    message: String,

    /// Broker UDP port
    #[arg(short, long, default_value_t = DEFAULT_BROKER_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Validate before touching the network
    let name = match TopicName::parse(&args.topic) {
        Ok(name) => name,
        Err(e) => {
            eprintln!("smb-publish: invalid topic '{}': {}", args.topic, e);
            eprintln!("{}", Args::command().render_usage());
            return ExitCode::FAILURE;
        }
    };

    match send(&args, &name).await {
        Ok(()) => {
            tracing::info!(topic = %name, "Message sent");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("smb-publish: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn send(args: &Args, name: &TopicName) -> smb_rs::Result<()> {
    let broker = smb_rs::transport::resolve(&args.host, args.port).await?;
    let mut publisher = Publisher::connect(PublisherConfig::new(broker)).await?;
    publisher.publish(name, args.message.clone()).await
}
