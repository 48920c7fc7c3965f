//! Topic-based publish/subscribe message broker over UDP
//!
//! Publishers send a message tagged `topic/subtopic`; the broker relays it
//! to every subscriber whose filter matches. A filter field may be the
//! wildcard `#`, which matches any value in that position.
//!
//! # Wire format
//!
//! | Command | Layout                                   |
//! |---------|------------------------------------------|
//! | `S`     | `S` topic [`/` subtopic]                 |
//! | `A`     | `A` topic `/` subtopic                   |
//! | `0x01`  | `0x01` topic `/` subtopic `0x02` payload |
//!
//! # Running a broker
//!
//! ```no_run
//! use smb_rs::{Broker, BrokerConfig};
//!
//! # async fn example() -> smb_rs::error::Result<()> {
//! let broker = Broker::bind(BrokerConfig::default().port(8080)).await?;
//! broker.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod stats;
pub mod transport;

pub use client::{ClientConfig, Publisher, PublisherConfig, Subscriber};
pub use error::{Error, Result};
pub use protocol::{Packet, PublishEvent, TopicFilter, TopicName};
pub use registry::{RegistryConfig, SubscriptionRegistry};
pub use server::{Broker, BrokerConfig};
pub use stats::BrokerStats;
