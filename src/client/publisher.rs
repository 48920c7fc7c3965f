//! Publisher client
//!
//! Publishing is fire-and-forget: one datagram per message, no reply.

use std::future::Future;
use std::io;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::protocol::constants::MAX_DATAGRAM_SIZE;
use crate::protocol::{Packet, TopicName};
use crate::transport::{bind_ephemeral, DatagramTransport};

use super::config::PublisherConfig;

/// Message publisher
///
/// # Example
/// ```no_run
/// use smb_rs::client::{Publisher, PublisherConfig};
/// use smb_rs::protocol::TopicName;
///
/// # async fn example() -> smb_rs::error::Result<()> {
/// let broker = smb_rs::transport::resolve("localhost", 8080).await?;
/// let mut publisher = Publisher::connect(PublisherConfig::new(broker)).await?;
///
/// let name = TopicName::parse("weather/berlin")?;
/// publisher.publish(&name, "rain").await?;
/// # Ok(())
/// # }
/// ```
pub struct Publisher<T: DatagramTransport = UdpSocket> {
    config: PublisherConfig,
    transport: T,
    messages_sent: u64,
}

impl Publisher<UdpSocket> {
    /// Bind an ephemeral UDP socket for talking to the configured broker
    pub async fn connect(config: PublisherConfig) -> Result<Self> {
        let socket = bind_ephemeral(config.broker_addr).await?;
        Ok(Self::with_transport(config, socket))
    }
}

impl<T: DatagramTransport> Publisher<T> {
    pub fn with_transport(config: PublisherConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            messages_sent: 0,
        }
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Messages handed to the transport so far
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent
    }

    /// Send one message
    ///
    /// Delivery is not confirmed. A frame that would not fit in a single
    /// datagram is refused before anything is sent.
    pub async fn publish(&mut self, name: &TopicName, payload: impl Into<Bytes>) -> Result<()> {
        let frame = Packet::publish(name, payload).encode();
        if frame.len() > MAX_DATAGRAM_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("message of {} bytes exceeds datagram limit", frame.len()),
            )
            .into());
        }

        let sent = self
            .transport
            .send_to(&frame, self.config.broker_addr)
            .await?;
        if sent < frame.len() {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "datagram truncated").into());
        }

        self.messages_sent += 1;
        tracing::debug!(
            broker = %self.config.broker_addr,
            topic = %name,
            bytes = frame.len(),
            "Message published"
        );
        Ok(())
    }

    /// Publish `payload()` every `interval`, starting immediately, until
    /// `shutdown` completes
    ///
    /// Send failures are logged and the loop keeps going.
    pub async fn run_until<F, P, B>(&mut self, name: &TopicName, shutdown: F, mut payload: P)
    where
        F: Future<Output = ()>,
        P: FnMut() -> B,
        B: Into<Bytes>,
    {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!(
            broker = %self.config.broker_addr,
            topic = %name,
            interval_ms = self.config.interval.as_millis() as u64,
            "Publishing periodically"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(sent = self.messages_sent, "Publisher stopped");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.publish(name, payload()).await {
                        tracing::warn!(topic = %name, error = %e, "Publish failed");
                    }
                }
            }
        }
    }

    /// Publish `payload()` every `interval`, forever
    pub async fn run<P, B>(&mut self, name: &TopicName, payload: P)
    where
        P: FnMut() -> B,
        B: Into<Bytes>,
    {
        self.run_until(name, std::future::pending(), payload).await
    }
}
