//! Subscriber client
//!
//! Drives [`SubscribeHandshake`] over a datagram transport: sends SUBSCRIBE,
//! resends it every time the ACK does not arrive within `ack_timeout`, and
//! once confirmed yields every PUBLISH the broker relays.

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::error::{Error, ProtocolError, Result};
use crate::protocol::{Packet, PublishEvent, SubscribeHandshake, TopicFilter};
use crate::transport::{bind_ephemeral, DatagramTransport};

use super::config::ClientConfig;
use super::state::{SubscriberPhase, SubscriberState};

/// Subscriber for one topic filter
///
/// # Example
/// ```no_run
/// use smb_rs::client::{ClientConfig, Subscriber};
/// use smb_rs::protocol::TopicFilter;
///
/// # async fn example() -> smb_rs::error::Result<()> {
/// let broker = smb_rs::transport::resolve("localhost", 8080).await?;
/// let filter = TopicFilter::parse("time/germany")?;
/// let mut subscriber = Subscriber::connect(ClientConfig::new(broker), filter).await?;
///
/// subscriber.subscribe().await?;
/// loop {
///     let event = subscriber.next_message().await?;
///     println!("{}: {}", event.name, event.payload_lossy());
/// }
/// # }
/// ```
pub struct Subscriber<T: DatagramTransport = UdpSocket> {
    config: ClientConfig,
    transport: T,
    handshake: SubscribeHandshake,
    state: SubscriberState,
    /// PUBLISH that confirmed the subscription in place of an ACK
    pending: Option<PublishEvent>,
    buf: Vec<u8>,
}

impl Subscriber<UdpSocket> {
    /// Bind an ephemeral UDP socket for talking to the configured broker
    pub async fn connect(config: ClientConfig, filter: TopicFilter) -> Result<Self> {
        let socket = bind_ephemeral(config.broker_addr).await?;
        Ok(Self::with_transport(config, filter, socket))
    }
}

impl<T: DatagramTransport> Subscriber<T> {
    /// Create a subscriber on an existing transport
    pub fn with_transport(config: ClientConfig, filter: TopicFilter, transport: T) -> Self {
        // One spare byte tells an exact fit from a truncated datagram
        let buf = vec![0u8; config.max_datagram_size.saturating_add(1)];
        let state = SubscriberState::new(config.broker_addr);
        Self {
            config,
            transport,
            handshake: SubscribeHandshake::new(filter),
            state,
            pending: None,
            buf,
        }
    }

    pub fn filter(&self) -> &TopicFilter {
        self.handshake.filter()
    }

    pub fn state(&self) -> &SubscriberState {
        &self.state
    }

    pub fn phase(&self) -> SubscriberPhase {
        self.state.phase
    }

    /// SUBSCRIBE datagrams sent so far
    pub fn attempts(&self) -> u32 {
        self.handshake.attempts()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.transport.local_addr()?)
    }

    /// Subscribe, retrying until the broker acknowledges
    ///
    /// There is no retry limit. Use [`subscribe_until`](Self::subscribe_until)
    /// to bound the wait.
    pub async fn subscribe(&mut self) -> Result<()> {
        self.run_handshake().await
    }

    /// Subscribe, giving up with [`Error::Cancelled`] when `cancel` completes
    ///
    /// Progress is kept: calling again continues the same handshake.
    pub async fn subscribe_until<F>(&mut self, cancel: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = cancel => {
                tracing::info!(filter = %self.handshake.filter(), "Subscribe cancelled");
                Err(Error::Cancelled)
            }
            result = self.run_handshake() => result,
        }
    }

    /// Wait for the next relayed message, subscribing first if needed
    pub async fn next_message(&mut self) -> Result<PublishEvent> {
        if !self.state.is_listening() {
            self.run_handshake().await?;
        }
        if let Some(event) = self.pending.take() {
            self.state.messages_received += 1;
            return Ok(event);
        }

        loop {
            let (len, from) = self.recv_from_broker().await?;

            match Packet::decode(&self.buf[..len]) {
                Ok(packet @ Packet::Publish { .. }) => {
                    match PublishEvent::from_packet(packet, from) {
                        Ok(event) => {
                            self.state.messages_received += 1;
                            tracing::debug!(
                                topic = %event.name,
                                bytes = event.payload.len(),
                                "Message received"
                            );
                            return Ok(event);
                        }
                        Err(e) => {
                            self.state.datagrams_ignored += 1;
                            tracing::warn!(error = %e, "Skipping invalid publish");
                        }
                    }
                }
                Ok(packet) => {
                    // Late duplicate ACKs land here
                    self.state.datagrams_ignored += 1;
                    tracing::debug!(command = packet.command().name(), "Skipping datagram");
                }
                Err(e) => {
                    self.state.datagrams_ignored += 1;
                    tracing::warn!(error = %e, "Skipping malformed datagram");
                }
            }
        }
    }

    /// Deliver every message to `on_message`, forever
    pub async fn listen<H>(&mut self, on_message: H) -> Result<()>
    where
        H: FnMut(PublishEvent),
    {
        self.listen_until(std::future::pending(), on_message).await
    }

    /// Deliver every message to `on_message` until `cancel` completes
    ///
    /// Returns `Ok(())` on cancellation once subscribed, or
    /// [`Error::Cancelled`] if the subscription was never confirmed.
    pub async fn listen_until<F, H>(&mut self, cancel: F, mut on_message: H) -> Result<()>
    where
        F: Future<Output = ()>,
        H: FnMut(PublishEvent),
    {
        tokio::pin!(cancel);

        loop {
            tokio::select! {
                _ = &mut cancel => {
                    return if self.state.is_listening() {
                        tracing::info!(
                            filter = %self.handshake.filter(),
                            messages = self.state.messages_received,
                            "Stopped listening"
                        );
                        Ok(())
                    } else {
                        Err(Error::Cancelled)
                    };
                }
                result = self.next_message() => on_message(result?),
            }
        }
    }

    async fn run_handshake(&mut self) -> Result<()> {
        if self.state.is_listening() {
            return Ok(());
        }

        if let Some(request) = self.handshake.generate_initial() {
            self.state.start();
            tracing::info!(
                broker = %self.config.broker_addr,
                filter = %self.handshake.filter(),
                "Subscribing"
            );
            self.send_request(&request).await;
        }

        loop {
            match tokio::time::timeout(self.config.ack_timeout, self.recv_from_broker()).await {
                Ok(Ok((len, from))) => {
                    let data = &self.buf[..len];
                    if self.handshake.process(data)? {
                        if let Ok(packet @ Packet::Publish { .. }) = Packet::decode(data) {
                            self.pending = PublishEvent::from_packet(packet, from).ok();
                        }
                        self.state.confirm();
                        tracing::info!(
                            filter = %self.handshake.filter(),
                            attempts = self.handshake.attempts(),
                            "Subscription confirmed"
                        );
                        return Ok(());
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "Receive failed while awaiting ack");
                    tokio::time::sleep(self.config.ack_timeout).await;
                    self.resend().await;
                }
                Err(_) => {
                    tracing::warn!(
                        filter = %self.handshake.filter(),
                        timeout_ms = self.config.ack_timeout.as_millis() as u64,
                        "No ack received, resending subscribe"
                    );
                    self.resend().await;
                }
            }
        }
    }

    async fn resend(&mut self) {
        if let Some(request) = self.handshake.on_timeout() {
            self.send_request(&request).await;
        }
    }

    async fn send_request(&self, request: &[u8]) {
        // A lost request is indistinguishable from a lost datagram; the next
        // timeout resends it
        if let Err(e) = self.transport.send_to(request, self.config.broker_addr).await {
            tracing::warn!(
                broker = %self.config.broker_addr,
                error = %e,
                "Failed to send subscribe"
            );
        }
    }

    /// Receive the next complete datagram from the broker's port
    async fn recv_from_broker(&mut self) -> io::Result<(usize, SocketAddr)> {
        let max = self.config.max_datagram_size;
        loop {
            let (len, from) = self.transport.recv_from(&mut self.buf).await?;
            if !self.state.is_from_broker(from) {
                self.state.datagrams_ignored += 1;
                tracing::debug!(from = %from, "Ignoring datagram from unknown source");
                continue;
            }
            if len > max {
                self.state.datagrams_ignored += 1;
                tracing::warn!(
                    from = %from,
                    error = %ProtocolError::Oversized { max },
                    "Skipping truncated datagram"
                );
                continue;
            }
            return Ok((len, from));
        }
    }
}
