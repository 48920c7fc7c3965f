//! Datagram encoding and decoding
//!
//! Every datagram is a single command byte followed by its fields:
//!
//! ```text
//! 'S'  topic [ '/' subtopic ]                    client -> broker
//! 'A'  topic   '/' subtopic                      broker -> client
//! 0x01 topic   '/' subtopic  0x02  payload       either direction
//! ```
//!
//! Decoding never mutates the input and splits on the first occurrence of
//! each separator, so the payload of a PUBLISH may contain any byte. A
//! decoded packet holds exactly what was on the wire; topic rules are
//! enforced when it is turned into a [`TopicFilter`] or [`TopicName`].

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;

use super::constants::{
    CMD_ACK, CMD_PUBLISH, CMD_SUBSCRIBE, PAYLOAD_SEPARATOR, TOPIC_SEPARATOR, WILDCARD,
};
use super::topic::{TopicFilter, TopicName};

/// Command carried in the first byte of a datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Subscribe,
    Ack,
    Publish,
}

impl Command {
    /// Map a command byte, `None` for anything unknown
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            CMD_SUBSCRIBE => Some(Command::Subscribe),
            CMD_ACK => Some(Command::Ack),
            CMD_PUBLISH => Some(Command::Publish),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Command::Subscribe => CMD_SUBSCRIBE,
            Command::Ack => CMD_ACK,
            Command::Publish => CMD_PUBLISH,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::Subscribe => "SUBSCRIBE",
            Command::Ack => "ACK",
            Command::Publish => "PUBLISH",
        }
    }
}

/// A decoded datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Register interest; a missing subtopic means the wildcard
    Subscribe {
        topic: String,
        subtopic: Option<String>,
    },
    /// Confirms the filter the broker now holds for the sender
    Ack { topic: String, subtopic: String },
    /// A message on a topic
    Publish {
        topic: String,
        subtopic: String,
        payload: Bytes,
    },
}

impl Packet {
    /// SUBSCRIBE for a filter (always sent with an explicit subtopic)
    pub fn subscribe(filter: &TopicFilter) -> Self {
        Packet::Subscribe {
            topic: filter.topic().to_string(),
            subtopic: Some(filter.subtopic().to_string()),
        }
    }

    /// ACK echoing a filter
    pub fn ack(filter: &TopicFilter) -> Self {
        Packet::Ack {
            topic: filter.topic().to_string(),
            subtopic: filter.subtopic().to_string(),
        }
    }

    /// PUBLISH of a payload on a topic
    pub fn publish(name: &TopicName, payload: impl Into<Bytes>) -> Self {
        Packet::Publish {
            topic: name.topic().to_string(),
            subtopic: name.subtopic().to_string(),
            payload: payload.into(),
        }
    }

    pub fn command(&self) -> Command {
        match self {
            Packet::Subscribe { .. } => Command::Subscribe,
            Packet::Ack { .. } => Command::Ack,
            Packet::Publish { .. } => Command::Publish,
        }
    }

    /// Topic and subtopic as carried on the wire
    ///
    /// A SUBSCRIBE without subtopic reports the wildcard.
    pub fn topic_pair(&self) -> (&str, &str) {
        match self {
            Packet::Subscribe { topic, subtopic } => {
                (topic.as_str(), subtopic.as_deref().unwrap_or(WILDCARD))
            }
            Packet::Ack { topic, subtopic } | Packet::Publish { topic, subtopic, .. } => {
                (topic.as_str(), subtopic.as_str())
            }
        }
    }

    /// Validated subscription filter of a SUBSCRIBE or ACK
    pub fn to_filter(&self) -> Result<TopicFilter, ProtocolError> {
        match self {
            Packet::Subscribe { .. } | Packet::Ack { .. } => {
                let (topic, subtopic) = self.topic_pair();
                Ok(TopicFilter::new(topic, subtopic)?)
            }
            Packet::Publish { .. } => Err(ProtocolError::UnexpectedPacket("PUBLISH")),
        }
    }

    /// Validated topic name of a PUBLISH
    pub fn to_topic_name(&self) -> Result<TopicName, ProtocolError> {
        match self {
            Packet::Publish {
                topic, subtopic, ..
            } => TopicName::new(topic.as_str(), subtopic.as_str()).map_err(ProtocolError::from),
            other => Err(ProtocolError::UnexpectedPacket(other.command().name())),
        }
    }

    /// Serialize to a datagram
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u8(self.command().as_byte());

        match self {
            Packet::Subscribe { topic, subtopic } => {
                buf.put_slice(topic.as_bytes());
                if let Some(subtopic) = subtopic {
                    buf.put_u8(TOPIC_SEPARATOR);
                    buf.put_slice(subtopic.as_bytes());
                }
            }
            Packet::Ack { topic, subtopic } => {
                buf.put_slice(topic.as_bytes());
                buf.put_u8(TOPIC_SEPARATOR);
                buf.put_slice(subtopic.as_bytes());
            }
            Packet::Publish {
                topic,
                subtopic,
                payload,
            } => {
                buf.put_slice(topic.as_bytes());
                buf.put_u8(TOPIC_SEPARATOR);
                buf.put_slice(subtopic.as_bytes());
                buf.put_u8(PAYLOAD_SEPARATOR);
                buf.put_slice(payload);
            }
        }

        buf.freeze()
    }

    fn encoded_len(&self) -> usize {
        match self {
            Packet::Subscribe { topic, subtopic } => {
                1 + topic.len() + subtopic.as_ref().map_or(0, |s| 1 + s.len())
            }
            Packet::Ack { topic, subtopic } => 2 + topic.len() + subtopic.len(),
            Packet::Publish {
                topic,
                subtopic,
                payload,
            } => 3 + topic.len() + subtopic.len() + payload.len(),
        }
    }

    /// Parse a datagram
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        let (&cmd, body) = data.split_first().ok_or(ProtocolError::Empty)?;
        let command = Command::from_byte(cmd).ok_or(ProtocolError::UnknownCommand(cmd))?;

        match command {
            Command::Subscribe => match split_at_byte(body, TOPIC_SEPARATOR) {
                Some((topic, subtopic)) => Ok(Packet::Subscribe {
                    topic: utf8(topic)?,
                    subtopic: Some(utf8(subtopic)?),
                }),
                None => Ok(Packet::Subscribe {
                    topic: utf8(body)?,
                    subtopic: None,
                }),
            },
            Command::Ack => {
                let (topic, subtopic) = split_topic_pair(body)?;
                Ok(Packet::Ack { topic, subtopic })
            }
            Command::Publish => {
                let (pair, payload) = split_at_byte(body, PAYLOAD_SEPARATOR)
                    .ok_or(ProtocolError::MissingPayloadSeparator)?;
                let (topic, subtopic) = split_topic_pair(pair)?;
                Ok(Packet::Publish {
                    topic,
                    subtopic,
                    payload: Bytes::copy_from_slice(payload),
                })
            }
        }
    }
}

fn split_at_byte(data: &[u8], sep: u8) -> Option<(&[u8], &[u8])> {
    let pos = data.iter().position(|&b| b == sep)?;
    Some((&data[..pos], &data[pos + 1..]))
}

fn split_topic_pair(data: &[u8]) -> Result<(String, String), ProtocolError> {
    let (topic, subtopic) =
        split_at_byte(data, TOPIC_SEPARATOR).ok_or(ProtocolError::MissingTopicSeparator)?;
    Ok((utf8(topic)?, utf8(subtopic)?))
}

fn utf8(data: &[u8]) -> Result<String, ProtocolError> {
    std::str::from_utf8(data)
        .map(str::to_owned)
        .map_err(|_| ProtocolError::InvalidUtf8)
}
