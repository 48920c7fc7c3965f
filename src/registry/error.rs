//! Registry error types

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A new subscriber would exceed the configured capacity
    Full { capacity: usize },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::Full { capacity } => {
                write!(f, "Registry full ({} registrations)", capacity)
            }
        }
    }
}

impl std::error::Error for RegistryError {}
