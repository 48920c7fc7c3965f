//! Subscribe to a topic and print every message
//!
//! Run with: smb-subscribe HOST TOPIC[/SUBTOPIC]
//!
//! Without a subtopic the subscription covers every subtopic (`TOPIC/#`).
//! Either field may be `#`.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use smb_rs::protocol::constants::{DEFAULT_ACK_TIMEOUT, DEFAULT_BROKER_PORT};
use smb_rs::{ClientConfig, Subscriber, TopicFilter};

#[derive(Parser)]
#[command(version, about = "Subscribe to a topic on an smb broker")]
struct Args {
    /// Broker hostname or address
    host: String,

    /// Topic filter, TOPIC or TOPIC/SUBTOPIC
    filter: String,

    /// Broker UDP port
    #[arg(short, long, default_value_t = DEFAULT_BROKER_PORT)]
    port: u16,

    /// Seconds to wait for the broker's acknowledgement before resending
    #[arg(
        long,
        default_value_t = DEFAULT_ACK_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    ack_timeout: u64,
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

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("smb-subscribe: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> smb_rs::Result<()> {
    let filter = TopicFilter::parse(&args.filter)?;
    let broker = smb_rs::transport::resolve(&args.host, args.port).await?;

    let config = ClientConfig::new(broker)
        .ack_timeout(Duration::from_secs(args.ack_timeout));
    let mut subscriber = Subscriber::connect(config, filter).await?;

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    subscriber.subscribe_until(shutdown).await?;

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    subscriber
        .listen_until(shutdown, |event| {
            println!("{}: {}", event.name, event.payload_lossy());
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ack_timeout_rejected() {
        let result = Args::try_parse_from(["smb-subscribe", "localhost", "time", "--ack-timeout", "0"]);
        assert!(result.is_err());

        let args = Args::try_parse_from(["smb-subscribe", "localhost", "time"]).unwrap();
        assert_eq!(args.ack_timeout, 15);
    }
}
