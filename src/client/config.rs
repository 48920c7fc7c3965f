//! Client configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::protocol::constants::{
    DEFAULT_ACK_TIMEOUT, DEFAULT_BROKER_PORT, DEFAULT_PUBLISH_INTERVAL, MAX_DATAGRAM_SIZE,
};

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Broker address; only datagrams from here are accepted
    pub broker_addr: SocketAddr,

    /// How long to wait for an ACK before resending SUBSCRIBE
    pub ack_timeout: Duration,

    /// Receive buffer size
    pub max_datagram_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            broker_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_BROKER_PORT),
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            max_datagram_size: MAX_DATAGRAM_SIZE,
        }
    }
}

impl ClientConfig {
    /// Config for the broker at `addr`
    pub fn new(broker_addr: SocketAddr) -> Self {
        Self {
            broker_addr,
            ..Default::default()
        }
    }

    pub fn ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    pub fn max_datagram_size(mut self, size: usize) -> Self {
        self.max_datagram_size = size.clamp(1, MAX_DATAGRAM_SIZE);
        self
    }
}

/// Publisher configuration
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Broker address
    pub broker_addr: SocketAddr,

    /// Period of the continuous publish loop
    pub interval: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            broker_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_BROKER_PORT),
            interval: DEFAULT_PUBLISH_INTERVAL,
        }
    }
}

impl PublisherConfig {
    pub fn new(broker_addr: SocketAddr) -> Self {
        Self {
            broker_addr,
            ..Default::default()
        }
    }

    /// Set the publish period; zero is raised to one millisecond
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }
}
