//! Registration types
//!
//! This module defines the per-subscriber record stored in the registry.

use std::fmt;
use std::net::SocketAddr;
use std::time::Instant;

use crate::protocol::TopicFilter;

/// Identity of a subscriber: the address and port its datagrams come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(SocketAddr);

impl SubscriberId {
    pub fn new(addr: SocketAddr) -> Self {
        Self(addr)
    }

    /// Address relayed messages are sent to
    pub fn addr(&self) -> SocketAddr {
        self.0
    }
}

impl From<SocketAddr> for SubscriberId {
    fn from(addr: SocketAddr) -> Self {
        Self(addr)
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One subscriber's current filter
#[derive(Debug, Clone)]
pub struct Registration {
    /// Who receives matching messages
    pub id: SubscriberId,

    /// Current filter (replaced on re-subscribe)
    pub filter: TopicFilter,

    /// Number of times the filter was replaced
    pub revision: u32,

    /// When the subscriber first registered
    pub created_at: Instant,

    /// When the filter was last set
    pub updated_at: Instant,
}

impl Registration {
    pub(super) fn new(id: SubscriberId, filter: TopicFilter) -> Self {
        let now = Instant::now();
        Self {
            id,
            filter,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the filter, keeping identity and creation time
    pub(super) fn replace_filter(&mut self, filter: TopicFilter) {
        self.filter = filter;
        self.revision = self.revision.saturating_add(1);
        self.updated_at = Instant::now();
    }

    /// True if this registration has never been updated
    pub fn is_new(&self) -> bool {
        self.revision == 0
    }

    /// Check whether a published topic pair should be relayed here
    pub fn matches(&self, topic: &str, subtopic: &str) -> bool {
        self.filter.matches(topic, subtopic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_replace_filter() {
        let id = SubscriberId::new(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 5000));
        let mut reg = Registration::new(id, TopicFilter::parse("weather").unwrap());
        assert!(reg.is_new());
        assert!(reg.matches("weather", "berlin"));

        reg.replace_filter(TopicFilter::parse("traffic/berlin").unwrap());
        assert!(!reg.is_new());
        assert_eq!(reg.revision, 1);
        assert!(reg.updated_at >= reg.created_at);
        assert!(!reg.matches("weather", "berlin"));
        assert!(reg.matches("traffic", "berlin"));
    }

    #[test]
    fn test_subscriber_id_display() {
        let id: SubscriberId = "127.0.0.1:5000".parse::<SocketAddr>().unwrap().into();
        assert_eq!(id.to_string(), "127.0.0.1:5000");
        assert_eq!(id.addr().port(), 5000);
    }
}
