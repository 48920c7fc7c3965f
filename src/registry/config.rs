//! Registry configuration

use crate::protocol::constants::DEFAULT_MAX_REGISTRATIONS;

/// Configuration for the subscription registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of registrations (0 = unlimited)
    pub max_registrations: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_registrations: DEFAULT_MAX_REGISTRATIONS,
        }
    }
}

impl RegistryConfig {
    /// Set the maximum number of registrations
    pub fn max_registrations(mut self, max: usize) -> Self {
        self.max_registrations = max;
        self
    }

    /// Remove the registration limit
    pub fn unlimited(mut self) -> Self {
        self.max_registrations = 0;
        self
    }

    /// Capacity as an option, `None` when unlimited
    pub fn capacity(&self) -> Option<usize> {
        (self.max_registrations > 0).then_some(self.max_registrations)
    }
}
