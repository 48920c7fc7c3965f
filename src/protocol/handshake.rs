//! Subscribe handshake
//!
//! A subscription is only trusted once the broker has echoed the exact
//! filter back. Either datagram can be lost, so the client resends the
//! request every time the acknowledgement does not arrive in time:
//!
//! ```text
//! Client                                   Broker
//!   |                                        |
//!   |------- S topic/subtopic ------------->|  (may be lost)
//!   |          ... timeout ...               |
//!   |------- S topic/subtopic ------------->|  upsert
//!   |<------ A topic/subtopic --------------|  (may be lost, resend again)
//!   |                                        |
//!   |        [Subscription confirmed]        |
//!   |<------ 0x01 topic/subtopic 0x02 ... --|
//! ```
//!
//! The state machine here does no I/O. The caller sends whatever bytes it
//! returns and feeds received datagrams into [`SubscribeHandshake::process`].

use bytes::Bytes;

use crate::error::{HandshakeError, ProtocolError};

use super::codec::Packet;
use super::topic::TopicFilter;

/// Handshake progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing sent yet
    Initial,
    /// SUBSCRIBE sent, waiting for the matching ACK
    AwaitingAck,
    /// Broker confirmed the filter
    Done,
}

/// Client side of the subscribe/acknowledge exchange
#[derive(Debug)]
pub struct SubscribeHandshake {
    filter: TopicFilter,
    request: Bytes,
    state: HandshakeState,
    attempts: u32,
}

impl SubscribeHandshake {
    /// Create a handshake for the given filter
    pub fn new(filter: TopicFilter) -> Self {
        let request = Packet::subscribe(&filter).encode();
        Self {
            filter,
            request,
            state: HandshakeState::Initial,
            attempts: 0,
        }
    }

    pub fn filter(&self) -> &TopicFilter {
        &self.filter
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Check if the broker has confirmed the subscription
    pub fn is_done(&self) -> bool {
        self.state == HandshakeState::Done
    }

    /// Number of SUBSCRIBE datagrams produced so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Produce the first SUBSCRIBE request
    ///
    /// Returns `None` if the handshake has already started.
    pub fn generate_initial(&mut self) -> Option<Bytes> {
        if self.state != HandshakeState::Initial {
            return None;
        }
        self.state = HandshakeState::AwaitingAck;
        self.attempts = 1;
        Some(self.request.clone())
    }

    /// Produce a retransmission after the ACK timed out
    ///
    /// There is no retry limit. Returns `None` outside `AwaitingAck`.
    pub fn on_timeout(&mut self) -> Option<Bytes> {
        if self.state != HandshakeState::AwaitingAck {
            return None;
        }
        self.attempts = self.attempts.saturating_add(1);
        Some(self.request.clone())
    }

    /// Process a datagram received from the broker
    ///
    /// Returns `Ok(true)` when the datagram confirms the requested filter.
    /// An ACK, or a PUBLISH, carrying any other topic pair is a mismatch;
    /// anything undecodable or of another kind is malformed. Both are
    /// fatal for the subscription. Outside `AwaitingAck` input is ignored.
    pub fn process(&mut self, data: &[u8]) -> Result<bool, HandshakeError> {
        if self.state != HandshakeState::AwaitingAck {
            return Ok(false);
        }

        let packet = Packet::decode(data).map_err(HandshakeError::Malformed)?;
        match packet {
            Packet::Ack { .. } | Packet::Publish { .. } => {
                let (topic, subtopic) = packet.topic_pair();
                if !self.filter.is(topic, subtopic) {
                    return Err(HandshakeError::Mismatch {
                        expected: self.filter.to_string(),
                        received: format!("{}/{}", topic, subtopic),
                    });
                }
                self.state = HandshakeState::Done;
                Ok(true)
            }
            Packet::Subscribe { .. } => Err(HandshakeError::Malformed(
                ProtocolError::UnexpectedPacket("SUBSCRIBE"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handshake(filter: &str) -> SubscribeHandshake {
        SubscribeHandshake::new(TopicFilter::parse(filter).unwrap())
    }

    #[test]
    fn test_initial_request() {
        let mut hs = handshake("time/germany");
        assert_eq!(hs.state(), HandshakeState::Initial);

        let request = hs.generate_initial().expect("first request");
        assert_eq!(&request[..], b"Stime/germany");
        assert_eq!(hs.state(), HandshakeState::AwaitingAck);
        assert_eq!(hs.attempts(), 1);
    }

    #[test]
    fn test_double_generate_initial_returns_none() {
        let mut hs = handshake("time/germany");
        assert!(hs.generate_initial().is_some());
        assert!(hs.generate_initial().is_none());
    }

    #[test]
    fn test_subtopic_defaults_to_wildcard_in_request() {
        let mut hs = handshake("weather");
        assert_eq!(&hs.generate_initial().unwrap()[..], b"Sweather/#");
    }

    #[test]
    fn test_timeout_resends_same_request() {
        let mut hs = handshake("time/germany");
        let first = hs.generate_initial().unwrap();

        for attempt in 2..=5 {
            let again = hs.on_timeout().expect("retransmission");
            assert_eq!(again, first);
            assert_eq!(hs.attempts(), attempt);
        }
        assert!(!hs.is_done());
    }

    #[test]
    fn test_timeout_before_start_or_after_done() {
        let mut hs = handshake("time/germany");
        assert!(hs.on_timeout().is_none());

        hs.generate_initial();
        hs.process(b"Atime/germany").unwrap();
        assert!(hs.on_timeout().is_none());
    }

    #[test]
    fn test_matching_ack_completes() {
        let mut hs = handshake("time/germany");
        hs.generate_initial();

        assert!(hs.process(b"Atime/germany").unwrap());
        assert!(hs.is_done());
    }

    #[test]
    fn test_matching_publish_completes() {
        let mut hs = handshake("time/germany");
        hs.generate_initial();

        assert!(hs.process(b"\x01time/germany\x02Mon Jan  1 00:00:00 2024").unwrap());
        assert!(hs.is_done());
    }

    #[test]
    fn test_mismatched_ack_fails() {
        let mut hs = handshake("time/germany");
        hs.generate_initial();

        let err = hs.process(b"Atime/france").unwrap_err();
        assert_eq!(
            err,
            HandshakeError::Mismatch {
                expected: "time/germany".into(),
                received: "time/france".into(),
            }
        );
        assert!(!hs.is_done());
    }

    #[test]
    fn test_wildcard_filter_needs_literal_echo() {
        let mut hs = handshake("time");
        hs.generate_initial();

        // A publish on time/germany is not an echo of time/#
        assert!(matches!(
            hs.process(b"\x01time/germany\x02now"),
            Err(HandshakeError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let mut hs = handshake("time/germany");
        hs.generate_initial();

        assert_eq!(
            hs.process(b"zzz"),
            Err(HandshakeError::Malformed(ProtocolError::UnknownCommand(b'z')))
        );
        assert_eq!(
            hs.process(b"Stime/germany"),
            Err(HandshakeError::Malformed(ProtocolError::UnexpectedPacket(
                "SUBSCRIBE"
            )))
        );
    }

    #[test]
    fn test_process_in_wrong_state() {
        let mut hs = handshake("time/germany");
        assert!(!hs.process(b"Atime/germany").unwrap());
        assert_eq!(hs.state(), HandshakeState::Initial);
    }

    #[test]
    fn test_converges_after_lost_acks() {
        let mut hs = handshake("weather/berlin");
        hs.generate_initial();

        // Three timeouts: request or ack lost each time
        for _ in 0..3 {
            hs.on_timeout();
        }
        assert!(hs.process(b"Aweather/berlin").unwrap());
        assert_eq!(hs.attempts(), 4);
    }
}
