//! Shared helpers for integration tests

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

use smb_rs::transport::DatagramTransport;
use smb_rs::{Broker, BrokerConfig, ClientConfig};

/// Ack timeout short enough to keep retry tests fast
pub const ACK_TIMEOUT: Duration = Duration::from_millis(100);

/// Upper bound for anything expected to arrive
pub const RECV_DEADLINE: Duration = Duration::from_secs(5);

/// Window in which nothing is expected to arrive
pub const QUIET_WINDOW: Duration = Duration::from_millis(200);

/// A broker running on a loopback port
pub struct TestBroker<T: DatagramTransport + 'static = UdpSocket> {
    pub broker: Arc<Broker<T>>,
    pub addr: SocketAddr,
    task: JoinHandle<()>,
}

impl<T: DatagramTransport + 'static> TestBroker<T> {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.addr).ack_timeout(ACK_TIMEOUT)
    }
}

impl<T: DatagramTransport + 'static> Drop for TestBroker<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub async fn loopback_socket() -> UdpSocket {
    UdpSocket::bind("127.0.0.1:0").await.unwrap()
}

/// Start a broker on 127.0.0.1 with an ephemeral port
pub async fn spawn_broker() -> TestBroker {
    spawn_broker_on(BrokerConfig::default(), loopback_socket().await)
}

/// Start a broker on an arbitrary transport
pub fn spawn_broker_on<T: DatagramTransport + 'static>(
    config: BrokerConfig,
    transport: T,
) -> TestBroker<T> {
    let broker = Arc::new(Broker::with_transport(config, transport));
    let addr = broker.local_addr().unwrap();

    let runner = Arc::clone(&broker);
    let task = tokio::spawn(async move {
        let _ = runner.run().await;
    });

    TestBroker { broker, addr, task }
}

/// UDP transport that silently drops its first `n` sends
pub struct LossyTransport {
    inner: UdpSocket,
    to_drop: AtomicUsize,
    dropped: AtomicUsize,
    sends: AtomicUsize,
}

impl LossyTransport {
    pub fn new(inner: UdpSocket, drop_first: usize) -> Self {
        Self {
            inner,
            to_drop: AtomicUsize::new(drop_first),
            dropped: AtomicUsize::new(0),
            sends: AtomicUsize::new(0),
        }
    }

    pub async fn loopback(drop_first: usize) -> Self {
        Self::new(loopback_socket().await, drop_first)
    }

    /// Sends swallowed so far
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    /// All send attempts, dropped or not
    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

impl DatagramTransport for LossyTransport {
    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        let drop_this = self
            .to_drop
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if drop_this {
            self.dropped.fetch_add(1, Ordering::SeqCst);
            return Ok(buf.len());
        }
        self.inner.send_to(buf, target).await
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.inner.recv_from(buf).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

/// Receive one datagram or fail after [`RECV_DEADLINE`]
pub async fn recv(socket: &UdpSocket) -> (Vec<u8>, SocketAddr) {
    let mut buf = vec![0u8; 65_536];
    let (len, from) = tokio::time::timeout(RECV_DEADLINE, socket.recv_from(&mut buf))
        .await
        .expect("datagram within deadline")
        .unwrap();
    buf.truncate(len);
    (buf, from)
}
