//! Subscriber state
//!
//! Tracks a subscriber from its first SUBSCRIBE to the listening phase.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Subscriber lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberPhase {
    /// Nothing sent yet
    Init,
    /// SUBSCRIBE sent, waiting for the broker's ACK
    AwaitingAck,
    /// Subscription confirmed, receiving publishes
    Listening,
}

/// Complete subscriber state
#[derive(Debug)]
pub struct SubscriberState {
    /// Broker address
    pub broker_addr: SocketAddr,

    /// Current phase
    pub phase: SubscriberPhase,

    /// Time the first SUBSCRIBE was sent
    pub started_at: Option<Instant>,

    /// Time the subscription was confirmed
    pub confirmed_at: Option<Instant>,

    /// PUBLISH datagrams delivered
    pub messages_received: u64,

    /// Datagrams skipped (foreign source, stray ACK, garbage)
    pub datagrams_ignored: u64,
}

impl SubscriberState {
    pub fn new(broker_addr: SocketAddr) -> Self {
        Self {
            broker_addr,
            phase: SubscriberPhase::Init,
            started_at: None,
            confirmed_at: None,
            messages_received: 0,
            datagrams_ignored: 0,
        }
    }

    /// First SUBSCRIBE sent
    pub fn start(&mut self) {
        if self.phase == SubscriberPhase::Init {
            self.phase = SubscriberPhase::AwaitingAck;
            self.started_at = Some(Instant::now());
        }
    }

    /// Broker confirmed the subscription
    pub fn confirm(&mut self) {
        if self.phase == SubscriberPhase::AwaitingAck {
            self.phase = SubscriberPhase::Listening;
            self.confirmed_at = Some(Instant::now());
        }
    }

    /// Time from the first SUBSCRIBE to confirmation
    pub fn handshake_duration(&self) -> Option<Duration> {
        match (self.started_at, self.confirmed_at) {
            (Some(start), Some(done)) => Some(done.duration_since(start)),
            _ => None,
        }
    }

    /// Whether `addr` could be the broker
    ///
    /// Only the port is compared. A broker bound to a wildcard address
    /// replies from whichever local IP the kernel picks, which need not be
    /// the one the request was sent to.
    pub fn is_from_broker(&self, addr: SocketAddr) -> bool {
        addr.port() == self.broker_addr.port()
    }

    pub fn is_listening(&self) -> bool {
        self.phase == SubscriberPhase::Listening
    }
}
