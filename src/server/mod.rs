//! Broker implementation
//!
//! The broker receives SUBSCRIBE and PUBLISH datagrams on one UDP socket,
//! keeps the subscription registry and relays each publish to every
//! subscriber whose filter matches.

pub mod config;
pub mod listener;
pub mod relay;

pub use config::BrokerConfig;
pub use listener::{Broker, DatagramOutcome};
pub use relay::{relay, RelayReport};
