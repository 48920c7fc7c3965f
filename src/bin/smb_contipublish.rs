//! Publish the current local time periodically
//!
//! Run with: smb-contipublish HOST [--interval SECS] [--topic TOPIC/SUBTOPIC]
//!
//! Defaults to `time/germany` every 10 seconds.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use smb_rs::protocol::constants::{DEFAULT_BROKER_PORT, DEFAULT_PUBLISH_INTERVAL};
use smb_rs::{Publisher, PublisherConfig, TopicName};

/// `asctime` layout without the trailing newline
const TIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

#[derive(Parser)]
#[command(version, about = "Continuously publish the local time to an smb broker")]
struct Args {
    /// Broker hostname or address
    host: String,

    /// Broker UDP port
    #[arg(short, long, default_value_t = DEFAULT_BROKER_PORT)]
    port: u16,

    /// Seconds between messages (at least 1)
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_PUBLISH_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    interval: u64,

    /// Topic name, TOPIC/SUBTOPIC
    #[arg(short, long, default_value = "time/germany")]
    topic: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("smb-contipublish: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> smb_rs::Result<()> {
    let name = TopicName::parse(&args.topic)?;
    let broker = smb_rs::transport::resolve(&args.host, args.port).await?;

    let config = PublisherConfig::new(broker).interval(Duration::from_secs(args.interval));
    let mut publisher = Publisher::connect(config).await?;

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    publisher
        .run_until(&name, shutdown, || {
            let now = chrono::Local::now().format(TIME_FORMAT).to_string();
            tracing::info!(topic = %name, time = %now, "Publishing time");
            now
        })
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_defaults() {
        let args = Args::try_parse_from(["smb-contipublish", "localhost"]).unwrap();
        assert_eq!(args.interval, 10);
        assert_eq!(args.topic, "time/germany");
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = Args::try_parse_from(["smb-contipublish", "localhost", "--interval", "0"]);
        assert!(result.is_err());

        let args =
            Args::try_parse_from(["smb-contipublish", "localhost", "--interval", "1"]).unwrap();
        assert_eq!(args.interval, 1);
    }
}
