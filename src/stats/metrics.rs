//! Statistics for the broker

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Live counters updated by the broker loop
#[derive(Debug)]
pub struct BrokerCounters {
    started_at: Instant,
    datagrams_received: AtomicU64,
    subscribes: AtomicU64,
    registrations_created: AtomicU64,
    registrations_updated: AtomicU64,
    subscribes_rejected: AtomicU64,
    acks_sent: AtomicU64,
    publishes: AtomicU64,
    relays_sent: AtomicU64,
    relays_failed: AtomicU64,
    protocol_errors: AtomicU64,
}

impl BrokerCounters {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            datagrams_received: AtomicU64::new(0),
            subscribes: AtomicU64::new(0),
            registrations_created: AtomicU64::new(0),
            registrations_updated: AtomicU64::new(0),
            subscribes_rejected: AtomicU64::new(0),
            acks_sent: AtomicU64::new(0),
            publishes: AtomicU64::new(0),
            relays_sent: AtomicU64::new(0),
            relays_failed: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
        }
    }

    pub(crate) fn datagram_received(&self) {
        self.datagrams_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn subscribe(&self, created: bool) {
        self.subscribes.fetch_add(1, Ordering::Relaxed);
        if created {
            self.registrations_created.fetch_add(1, Ordering::Relaxed);
        } else {
            self.registrations_updated.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn subscribe_rejected(&self) {
        self.subscribes_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn ack_sent(&self) {
        self.acks_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn publish(&self, sent: u64, failed: u64) {
        self.publishes.fetch_add(1, Ordering::Relaxed);
        self.relays_sent.fetch_add(sent, Ordering::Relaxed);
        self.relays_failed.fetch_add(failed, Ordering::Relaxed);
    }

    pub(crate) fn protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self, registrations: usize) -> BrokerStats {
        BrokerStats {
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            subscribes: self.subscribes.load(Ordering::Relaxed),
            registrations_created: self.registrations_created.load(Ordering::Relaxed),
            registrations_updated: self.registrations_updated.load(Ordering::Relaxed),
            subscribes_rejected: self.subscribes_rejected.load(Ordering::Relaxed),
            acks_sent: self.acks_sent.load(Ordering::Relaxed),
            publishes: self.publishes.load(Ordering::Relaxed),
            relays_sent: self.relays_sent.load(Ordering::Relaxed),
            relays_failed: self.relays_failed.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            registrations: registrations as u64,
            uptime: self.started_at.elapsed(),
        }
    }
}

impl Default for BrokerCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Broker-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrokerStats {
    /// Datagrams read from the socket
    pub datagrams_received: u64,
    /// Accepted SUBSCRIBE requests
    pub subscribes: u64,
    /// Subscribes that created a registration
    pub registrations_created: u64,
    /// Subscribes that replaced an existing filter
    pub registrations_updated: u64,
    /// Subscribes refused because the registry was full
    pub subscribes_rejected: u64,
    /// ACK datagrams sent successfully
    pub acks_sent: u64,
    /// PUBLISH datagrams processed
    pub publishes: u64,
    /// Relayed messages sent
    pub relays_sent: u64,
    /// Relayed messages that failed to send
    pub relays_failed: u64,
    /// Datagrams discarded as malformed or unknown
    pub protocol_errors: u64,
    /// Current registrations
    pub registrations: u64,
    /// Time since the broker started
    pub uptime: Duration,
}

impl BrokerStats {
    /// Relay attempts (sent + failed)
    pub fn relays_attempted(&self) -> u64 {
        self.relays_sent + self.relays_failed
    }
}
