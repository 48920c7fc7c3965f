//! Broker receive loop
//!
//! One loop reads datagrams and handles each completely (registry update
//! and ACK, or the full relay fan-out) before reading the next.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tokio::sync::RwLock;

use crate::error::{ProtocolError, Result};
use crate::protocol::{Packet, PublishEvent, TopicFilter};
use crate::registry::{RegistryError, SubscriberId, SubscriptionRegistry};
use crate::server::config::BrokerConfig;
use crate::server::relay::{relay, RelayReport};
use crate::stats::{BrokerCounters, BrokerStats};
use crate::transport::DatagramTransport;

/// What the broker did with one datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatagramOutcome {
    /// Subscription stored; `acked` is false if the ACK could not be sent
    Subscribed {
        filter: TopicFilter,
        created: bool,
        acked: bool,
    },
    /// Subscription refused, no ACK sent
    Rejected(RegistryError),
    /// Publish relayed to matching subscribers
    Published(RelayReport),
    /// Datagram dropped without reply
    Discarded(ProtocolError),
}

/// Publish/subscribe broker
pub struct Broker<T: DatagramTransport = UdpSocket> {
    config: BrokerConfig,
    transport: T,
    registry: RwLock<SubscriptionRegistry>,
    counters: BrokerCounters,
}

impl Broker<UdpSocket> {
    /// Bind a UDP socket on the configured address
    pub async fn bind(config: BrokerConfig) -> Result<Self> {
        let socket = UdpSocket::bind(config.bind_addr).await?;
        Ok(Self::with_transport(config, socket))
    }
}

impl<T: DatagramTransport> Broker<T> {
    /// Create a broker on an existing transport
    pub fn with_transport(config: BrokerConfig, transport: T) -> Self {
        let registry = SubscriptionRegistry::with_config(config.registry.clone());
        Self {
            config,
            transport,
            registry: RwLock::new(registry),
            counters: BrokerCounters::new(),
        }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Address the broker is receiving on
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.transport.local_addr()?)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The subscription registry
    pub fn registry(&self) -> &RwLock<SubscriptionRegistry> {
        &self.registry
    }

    /// Current statistics
    pub async fn stats(&self) -> BrokerStats {
        let registrations = self.registry.read().await.len();
        self.counters.snapshot(registrations)
    }

    /// Run the broker
    ///
    /// This method only returns if the receive buffer cannot be allocated;
    /// receive errors are logged and the loop continues.
    pub async fn run(&self) -> Result<()> {
        tracing::info!(addr = %self.bind_addr_display(), "Broker listening");
        self.receive_loop().await
    }

    /// Run the broker until `shutdown` completes
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(addr = %self.bind_addr_display(), "Broker listening");

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.receive_loop() => result,
        }
    }

    async fn receive_loop(&self) -> Result<()> {
        // One spare byte tells an exact fit from a truncated datagram
        let mut buf = vec![0u8; self.config.max_datagram_size.saturating_add(1)];

        loop {
            match self.transport.recv_from(&mut buf).await {
                Ok((len, peer)) => {
                    self.handle_datagram(&buf[..len], peer).await;
                }
                Err(e) => {
                    // ICMP errors from earlier relays surface here on some platforms
                    tracing::warn!(error = %e, "Failed to receive datagram");
                }
            }
        }
    }

    /// Handle one datagram from `peer`
    pub async fn handle_datagram(&self, data: &[u8], peer: SocketAddr) -> DatagramOutcome {
        self.counters.datagram_received();

        let max = self.config.max_datagram_size;
        let outcome = if data.len() > max {
            // The tail is gone; decoding the prefix would relay a cut message
            DatagramOutcome::Discarded(ProtocolError::Oversized { max })
        } else {
            match Packet::decode(data) {
                Ok(packet @ Packet::Subscribe { .. }) => self.handle_subscribe(packet, peer).await,
                Ok(packet @ Packet::Publish { .. }) => self.handle_publish(packet, peer).await,
                Ok(Packet::Ack { .. }) => {
                    DatagramOutcome::Discarded(ProtocolError::UnexpectedPacket("ACK"))
                }
                Err(e) => DatagramOutcome::Discarded(e),
            }
        };

        if let DatagramOutcome::Discarded(ref e) = outcome {
            self.counters.protocol_error();
            match e {
                ProtocolError::UnknownCommand(cmd) => {
                    tracing::warn!(peer = %peer, command = *cmd, "Received unknown command")
                }
                _ => tracing::warn!(peer = %peer, error = %e, "Discarding datagram"),
            }
        }

        outcome
    }

    async fn handle_subscribe(&self, packet: Packet, peer: SocketAddr) -> DatagramOutcome {
        let filter = match packet.to_filter() {
            Ok(filter) => filter,
            Err(e) => return DatagramOutcome::Discarded(e),
        };
        let id = SubscriberId::new(peer);

        tracing::debug!(peer = %peer, filter = %filter, "Subscribe request");

        let (filter, created) = {
            let mut registry = self.registry.write().await;
            match registry.upsert(id, filter) {
                Ok(registration) => (registration.filter.clone(), registration.is_new()),
                Err(e) => {
                    self.counters.subscribe_rejected();
                    tracing::warn!(peer = %peer, error = %e, "Subscribe rejected");
                    return DatagramOutcome::Rejected(e);
                }
            }
        };
        self.counters.subscribe(created);

        let ack = Packet::ack(&filter).encode();
        let acked = match self.transport.send_to(&ack, peer).await {
            Ok(_) => {
                self.counters.ack_sent();
                tracing::info!(peer = %peer, filter = %filter, "Ack sent");
                true
            }
            Err(e) => {
                tracing::warn!(peer = %peer, error = %e, "Failed to send ack");
                false
            }
        };

        DatagramOutcome::Subscribed {
            filter,
            created,
            acked,
        }
    }

    async fn handle_publish(&self, packet: Packet, peer: SocketAddr) -> DatagramOutcome {
        let event = match PublishEvent::from_packet(packet, peer) {
            Ok(event) => event,
            Err(e) => return DatagramOutcome::Discarded(e),
        };

        tracing::info!(
            peer = %peer,
            topic = %event.name,
            bytes = event.payload.len(),
            "Publish received"
        );

        // Held for the whole fan-out so no subscribe interleaves with it
        let registry = self.registry.read().await;
        let report = relay(&self.transport, &registry, &event).await;
        drop(registry);

        self.counters
            .publish(report.sent as u64, report.failed as u64);

        if report.matched == 0 {
            tracing::debug!(topic = %event.name, "No matching subscribers");
        }

        DatagramOutcome::Published(report)
    }

    fn bind_addr_display(&self) -> SocketAddr {
        self.transport.local_addr().unwrap_or(self.config.bind_addr)
    }
}
