//! Client implementation
//!
//! - [`Subscriber`]: subscribe with the acknowledged handshake, then receive
//!   relayed messages
//! - [`Publisher`]: send messages, once or periodically

pub mod config;
pub mod publisher;
pub mod state;
pub mod subscriber;

pub use config::{ClientConfig, PublisherConfig};
pub use publisher::Publisher;
pub use state::{SubscriberPhase, SubscriberState};
pub use subscriber::Subscriber;
