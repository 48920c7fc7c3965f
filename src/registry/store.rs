//! Subscription registry implementation
//!
//! The table of subscribers the broker relays to. Lookup by identity goes
//! through a hash index; iteration order is registration order and does not
//! change when a filter is replaced.

use std::collections::HashMap;

use crate::protocol::TopicFilter;

use super::config::RegistryConfig;
use super::entry::{Registration, SubscriberId};
use super::error::RegistryError;

/// Registry of subscriber filters
///
/// Not synchronized. The broker owns one instance and serializes access to
/// it, so a relay never observes a half-applied upsert.
#[derive(Debug)]
pub struct SubscriptionRegistry {
    /// Position of each subscriber in `entries`
    index: HashMap<SubscriberId, usize>,

    /// Registrations in insertion order
    entries: Vec<Registration>,

    config: RegistryConfig,
}

impl SubscriptionRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a subscriber or replace its filter
    ///
    /// A known subscriber keeps its position and gets the new filter. A new
    /// subscriber is appended, unless the registry is at capacity, in which
    /// case nothing changes and [`RegistryError::Full`] is returned.
    pub fn upsert(
        &mut self,
        id: SubscriberId,
        filter: TopicFilter,
    ) -> Result<&Registration, RegistryError> {
        if let Some(&pos) = self.index.get(&id) {
            let entry = &mut self.entries[pos];
            entry.replace_filter(filter);

            tracing::info!(
                subscriber = %id,
                filter = %entry.filter,
                revision = entry.revision,
                "Registration updated"
            );
            return Ok(&self.entries[pos]);
        }

        if let Some(capacity) = self.config.capacity() {
            if self.entries.len() >= capacity {
                return Err(RegistryError::Full { capacity });
            }
        }

        let pos = self.entries.len();
        self.entries.push(Registration::new(id, filter));
        self.index.insert(id, pos);

        let entry = &self.entries[pos];
        tracing::info!(
            subscriber = %id,
            filter = %entry.filter,
            registrations = self.entries.len(),
            "Registration created"
        );
        Ok(entry)
    }

    /// Registrations whose filter selects `topic/subtopic`, in registration order
    pub fn match_all<'a>(
        &'a self,
        topic: &'a str,
        subtopic: &'a str,
    ) -> impl Iterator<Item = &'a Registration> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.matches(topic, subtopic))
    }

    /// Look up a subscriber's registration
    pub fn get(&self, id: &SubscriberId) -> Option<&Registration> {
        self.index.get(id).map(|&pos| &self.entries[pos])
    }

    /// All registrations in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter()
    }

    /// Number of registrations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of registrations, `None` when unlimited
    pub fn capacity(&self) -> Option<usize> {
        self.config.capacity()
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
