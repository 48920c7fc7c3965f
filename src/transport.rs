//! Datagram transport
//!
//! Broker and clients talk to the network through [`DatagramTransport`], which
//! `tokio::net::UdpSocket` implements directly. Tests substitute in-memory or
//! lossy implementations.

use std::future::Future;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::UdpSocket;

use crate::error::{Error, Result};

/// Connectionless, message-oriented transport
pub trait DatagramTransport: Send + Sync {
    /// Send one datagram to `target`
    fn send_to(
        &self,
        buf: &[u8],
        target: SocketAddr,
    ) -> impl Future<Output = io::Result<usize>> + Send;

    /// Receive one datagram, returning its length and source
    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = io::Result<(usize, SocketAddr)>> + Send;

    /// Local address the transport is bound to
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

impl DatagramTransport for UdpSocket {
    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, target).await
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        UdpSocket::local_addr(self)
    }
}

impl<T: DatagramTransport> DatagramTransport for Arc<T> {
    fn send_to(
        &self,
        buf: &[u8],
        target: SocketAddr,
    ) -> impl Future<Output = io::Result<usize>> + Send {
        (**self).send_to(buf, target)
    }

    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = io::Result<(usize, SocketAddr)>> + Send {
        (**self).recv_from(buf)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        (**self).local_addr()
    }
}

/// Resolve `host` to a socket address on `port`
///
/// IPv4 results are preferred, matching a broker bound to `0.0.0.0`.
pub async fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| {
            tracing::debug!(host = host, error = %e, "Lookup failed");
            Error::Resolve(host.to_string())
        })?
        .collect();

    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| Error::Resolve(host.to_string()))
}

/// Bind a socket on an ephemeral port suitable for talking to `peer`
pub async fn bind_ephemeral(peer: SocketAddr) -> io::Result<UdpSocket> {
    let local = match peer.ip() {
        IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
    };
    UdpSocket::bind(local).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_localhost() {
        let addr = resolve("127.0.0.1", 8080).await.unwrap();
        assert_eq!(addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_resolve_failure() {
        let result = resolve("host.invalid.", 8080).await;
        assert!(matches!(result, Err(Error::Resolve(_))));
    }

    #[tokio::test]
    async fn test_udp_socket_transport() {
        let a = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let b = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let b_addr = DatagramTransport::local_addr(&b).unwrap();

        DatagramTransport::send_to(&a, b"ping", b_addr).await.unwrap();

        let mut buf = [0u8; 16];
        let (len, from) = DatagramTransport::recv_from(&b, &mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"ping");
        assert_eq!(from, DatagramTransport::local_addr(&a).unwrap());
    }
}
