//! Publish events
//!
//! A [`PublishEvent`] is built from one inbound PUBLISH datagram and handed
//! to the relay (broker side) or to the consumer (subscriber side). The
//! payload is a `Bytes`, so relaying to many subscribers shares one
//! allocation.

use std::net::SocketAddr;

use bytes::Bytes;

use crate::error::ProtocolError;

use super::codec::Packet;
use super::topic::TopicName;

/// A message published on a topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishEvent {
    /// Topic the message was published to
    pub name: TopicName,
    /// Opaque message body
    pub payload: Bytes,
    /// Address the datagram came from
    pub sender: SocketAddr,
}

impl PublishEvent {
    pub fn new(name: TopicName, payload: impl Into<Bytes>, sender: SocketAddr) -> Self {
        Self {
            name,
            payload: payload.into(),
            sender,
        }
    }

    /// Build an event from a decoded PUBLISH packet
    ///
    /// Fails for any other packet kind and for topic names that are empty,
    /// oversized or wildcards.
    pub fn from_packet(packet: Packet, sender: SocketAddr) -> Result<Self, ProtocolError> {
        let name = packet.to_topic_name()?;
        match packet {
            Packet::Publish { payload, .. } => Ok(Self::new(name, payload, sender)),
            other => Err(ProtocolError::UnexpectedPacket(other.command().name())),
        }
    }

    pub fn topic(&self) -> &str {
        self.name.topic()
    }

    pub fn subtopic(&self) -> &str {
        self.name.subtopic()
    }

    /// Payload as text, replacing invalid UTF-8
    pub fn payload_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// The PUBLISH packet that carries this event
    pub fn to_packet(&self) -> Packet {
        Packet::publish(&self.name, self.payload.clone())
    }
}
