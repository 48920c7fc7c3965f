//! Broker daemon
//!
//! Run with: smb-broker [--bind ADDR] [--port N]
//!
//! Set `RUST_LOG=smb_rs=debug` for per-datagram logging.

use std::net::IpAddr;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use smb_rs::protocol::constants::{
    DEFAULT_BROKER_PORT, DEFAULT_MAX_REGISTRATIONS, MAX_DATAGRAM_SIZE,
};
use smb_rs::{Broker, BrokerConfig};

#[derive(Parser)]
#[command(version, about = "Topic-based publish/subscribe broker over UDP")]
struct Args {
    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// UDP port to listen on
    #[arg(short, long, default_value_t = DEFAULT_BROKER_PORT)]
    port: u16,

    /// Maximum number of subscribers (0 = unlimited)
    #[arg(long, default_value_t = DEFAULT_MAX_REGISTRATIONS)]
    max_registrations: usize,

    /// Receive buffer size in bytes
    #[arg(long, default_value_t = MAX_DATAGRAM_SIZE)]
    max_datagram_size: usize,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BrokerConfig::default()
        .bind((args.bind, args.port).into())
        .max_registrations(args.max_registrations)
        .max_datagram_size(args.max_datagram_size);

    let broker = match Broker::bind(config).await {
        Ok(broker) => broker,
        Err(e) => {
            eprintln!("smb-broker: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = broker
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    let stats = broker.stats().await;
    tracing::info!(
        subscribers = stats.registrations,
        publishes = stats.publishes,
        relays_sent = stats.relays_sent,
        relays_failed = stats.relays_failed,
        protocol_errors = stats.protocol_errors,
        uptime_secs = stats.uptime.as_secs(),
        "Broker stopped"
    );

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("smb-broker: {}", e);
            ExitCode::FAILURE
        }
    }
}
