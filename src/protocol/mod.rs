//! Wire protocol
//!
//! Command bytes and separators, topic validation, datagram codec, and the
//! client side of the subscribe handshake.

pub mod codec;
pub mod constants;
pub mod handshake;
pub mod message;
pub mod topic;

pub use codec::{Command, Packet};
pub use handshake::{HandshakeState, SubscribeHandshake};
pub use message::PublishEvent;
pub use topic::{TopicFilter, TopicName};
