//! Broker configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::protocol::constants::{DEFAULT_BROKER_PORT, MAX_DATAGRAM_SIZE};
use crate::registry::RegistryConfig;

/// Broker configuration options
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Receive buffer size; longer datagrams are truncated by the OS
    pub max_datagram_size: usize,

    /// Subscription registry settings
    pub registry: RegistryConfig,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_BROKER_PORT),
            max_datagram_size: MAX_DATAGRAM_SIZE,
            registry: RegistryConfig::default(),
        }
    }
}

impl BrokerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the port, keeping the bind IP
    pub fn port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }

    /// Set the receive buffer size
    pub fn max_datagram_size(mut self, size: usize) -> Self {
        self.max_datagram_size = size.clamp(1, MAX_DATAGRAM_SIZE);
        self
    }

    /// Set the registry capacity (0 = unlimited)
    pub fn max_registrations(mut self, max: usize) -> Self {
        self.registry = self.registry.max_registrations(max);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrokerConfig::default();

        assert_eq!(config.bind_addr.port(), 8080);
        assert!(config.bind_addr.ip().is_unspecified());
        assert_eq!(config.max_datagram_size, MAX_DATAGRAM_SIZE);
        assert_eq!(config.registry.max_registrations, 512);
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let config = BrokerConfig::with_addr(addr);

        assert_eq!(config.bind_addr, addr);
    }

    #[test]
    fn test_builder_port() {
        let config = BrokerConfig::default().port(9999);

        assert_eq!(config.bind_addr.port(), 9999);
        assert!(config.bind_addr.ip().is_unspecified());
    }

    #[test]
    fn test_builder_max_datagram_size_clamped() {
        assert_eq!(
            BrokerConfig::default().max_datagram_size(usize::MAX).max_datagram_size,
            MAX_DATAGRAM_SIZE
        );
        assert_eq!(BrokerConfig::default().max_datagram_size(0).max_datagram_size, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let config = BrokerConfig::default()
            .bind(addr)
            .max_datagram_size(2048)
            .max_registrations(16);

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_datagram_size, 2048);
        assert_eq!(config.registry.max_registrations, 16);
    }
}
