//! Subscription registry
//!
//! The registry maps each subscriber (source address + port) to exactly one
//! topic filter and answers "who wants `topic/subtopic`?" for the relay.
//!
//! # Architecture
//!
//! ```text
//!              SubscriptionRegistry
//!     ┌────────────────────────────────────┐
//!     │ index:   HashMap<SubscriberId, pos>│  O(1) upsert
//!     │ entries: Vec<Registration>         │  insertion order
//!     └───────────────┬────────────────────┘
//!                     │
//!        ┌────────────┴────────────┐
//!        ▼                         ▼
//!   upsert(id, filter)     match_all(topic, subtopic)
//!   (SUBSCRIBE)            (PUBLISH -> relay)
//! ```
//!
//! Registrations are never removed: there is no unsubscribe and no expiry.

pub mod config;
pub mod entry;
pub mod error;
pub mod store;

pub use config::RegistryConfig;
pub use entry::{Registration, SubscriberId};
pub use error::RegistryError;
pub use store::SubscriptionRegistry;
