//! Message relay
//!
//! Forwards a publish event to every matching registration. The frame is
//! encoded once and the same bytes go to each subscriber. A failed send is
//! logged and counted; it never stops delivery to the others.

use crate::protocol::PublishEvent;
use crate::registry::SubscriptionRegistry;
use crate::transport::DatagramTransport;

/// Outcome of relaying one event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    /// Registrations whose filter matched
    pub matched: usize,
    /// Datagrams sent in full
    pub sent: usize,
    /// Sends that errored or were truncated
    pub failed: usize,
}

/// Relay `event` to all registrations matching its topic
pub async fn relay<T: DatagramTransport>(
    transport: &T,
    registry: &SubscriptionRegistry,
    event: &PublishEvent,
) -> RelayReport {
    let frame = event.to_packet().encode();
    let mut report = RelayReport::default();

    for registration in registry.match_all(event.topic(), event.subtopic()) {
        report.matched += 1;
        let target = registration.id.addr();

        match transport.send_to(&frame, target).await {
            Ok(n) if n == frame.len() => {
                report.sent += 1;
                tracing::info!(
                    subscriber = %registration.id,
                    filter = %registration.filter,
                    topic = %event.name,
                    "Message relayed"
                );
            }
            Ok(n) => {
                report.failed += 1;
                tracing::warn!(
                    subscriber = %registration.id,
                    topic = %event.name,
                    sent = n,
                    expected = frame.len(),
                    "Relay truncated"
                );
            }
            Err(e) => {
                report.failed += 1;
                tracing::warn!(
                    subscriber = %registration.id,
                    topic = %event.name,
                    error = %e,
                    "Relay failed"
                );
            }
        }
    }

    report
}
