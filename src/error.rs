//! Error types
//!
//! Errors are grouped by where they originate: the socket, the wire format,
//! caller-supplied topic fields, the registry, or the subscribe handshake.

use std::fmt;
use std::io;

use crate::registry::RegistryError;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// Socket creation, bind, send or receive failure
    Io(io::Error),
    /// Datagram could not be decoded
    Protocol(ProtocolError),
    /// Topic or subtopic rejected before sending
    Validation(ValidationError),
    /// Registry rejected the operation
    Registry(RegistryError),
    /// Subscription could not be confirmed
    Handshake(HandshakeError),
    /// Hostname did not resolve to a usable address
    Resolve(String),
    /// Caller cancelled the operation
    Cancelled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Protocol(e) => write!(f, "Protocol error: {}", e),
            Error::Validation(e) => write!(f, "Invalid input: {}", e),
            Error::Registry(e) => write!(f, "Registry error: {}", e),
            Error::Handshake(e) => write!(f, "Handshake failed: {}", e),
            Error::Resolve(host) => write!(f, "Could not resolve host: {}", host),
            Error::Cancelled => write!(f, "Operation cancelled"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Protocol(e) => Some(e),
            Error::Validation(e) => Some(e),
            Error::Registry(e) => Some(e),
            Error::Handshake(e) => Some(e),
            Error::Resolve(_) | Error::Cancelled => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Error::Registry(e)
    }
}

impl From<HandshakeError> for Error {
    fn from(e: HandshakeError) -> Self {
        Error::Handshake(e)
    }
}

/// Wire format errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Zero-length datagram
    Empty,
    /// Leading byte is not a known command
    UnknownCommand(u8),
    /// No `/` between topic and subtopic
    MissingTopicSeparator,
    /// No `0x02` between topic pair and payload
    MissingPayloadSeparator,
    /// Topic or subtopic is not valid UTF-8
    InvalidUtf8,
    /// A decoded field violates the topic rules
    InvalidField(ValidationError),
    /// Well-formed packet in a context where it is not allowed
    UnexpectedPacket(&'static str),
    /// Datagram longer than the receive limit; its tail was lost
    Oversized { max: usize },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Empty => write!(f, "empty datagram"),
            ProtocolError::UnknownCommand(b) => write!(f, "unknown command byte 0x{:02x}", b),
            ProtocolError::MissingTopicSeparator => write!(f, "missing topic separator"),
            ProtocolError::MissingPayloadSeparator => write!(f, "missing payload separator"),
            ProtocolError::InvalidUtf8 => write!(f, "topic is not valid UTF-8"),
            ProtocolError::InvalidField(e) => write!(f, "{}", e),
            ProtocolError::UnexpectedPacket(kind) => write!(f, "unexpected {} packet", kind),
            ProtocolError::Oversized { max } => {
                write!(f, "datagram exceeds {} bytes", max)
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<ValidationError> for ProtocolError {
    fn from(e: ValidationError) -> Self {
        ProtocolError::InvalidField(e)
    }
}

/// Which field of a message a validation error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Topic,
    Subtopic,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Topic => write!(f, "topic"),
            Field::Subtopic => write!(f, "subtopic"),
        }
    }
}

/// Topic field validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is the empty string
    Empty(Field),
    /// Field exceeds the maximum length
    TooLong {
        field: Field,
        len: usize,
        max: usize,
    },
    /// Field contains one of the reserved separator bytes
    ReservedByte { field: Field, byte: u8 },
    /// Wildcard used where only literal topics are allowed
    Wildcard(Field),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty(field) => write!(f, "{} must not be empty", field),
            ValidationError::TooLong { field, len, max } => {
                write!(f, "{} is {} bytes long (max {})", field, len, max)
            }
            ValidationError::ReservedByte { field, byte } => {
                write!(f, "{} contains reserved byte 0x{:02x}", field, byte)
            }
            ValidationError::Wildcard(field) => {
                write!(f, "{} must not be a wildcard when publishing", field)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Subscribe handshake failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// Broker confirmed a different topic than the one requested
    Mismatch { expected: String, received: String },
    /// Broker reply could not be decoded or was not an ACK/PUBLISH
    Malformed(ProtocolError),
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::Mismatch { expected, received } => write!(
                f,
                "requested '{}' but broker confirmed '{}'",
                expected, received
            ),
            HandshakeError::Malformed(e) => write!(f, "unusable reply: {}", e),
        }
    }
}

impl std::error::Error for HandshakeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::TooLong {
            field: Field::Subtopic,
            len: 600,
            max: 512,
        };
        assert_eq!(err.to_string(), "subtopic is 600 bytes long (max 512)");

        let err = ValidationError::ReservedByte {
            field: Field::Topic,
            byte: b'/',
        };
        assert_eq!(err.to_string(), "topic contains reserved byte 0x2f");
    }

    #[test]
    fn test_conversions() {
        let err: Error = ProtocolError::UnknownCommand(b'x').into();
        assert!(matches!(err, Error::Protocol(ProtocolError::UnknownCommand(b'x'))));

        let err: Error = HandshakeError::Malformed(ProtocolError::Empty).into();
        assert!(err.to_string().starts_with("Handshake failed"));

        let err: ProtocolError = ValidationError::Empty(Field::Topic).into();
        assert_eq!(err, ProtocolError::InvalidField(ValidationError::Empty(Field::Topic)));
    }
}
