//! Protocol constants

use std::time::Duration;

/// Command byte of a subscribe request
pub const CMD_SUBSCRIBE: u8 = b'S';

/// Command byte of a subscribe acknowledgement
pub const CMD_ACK: u8 = b'A';

/// Command byte of a publish (both directions)
pub const CMD_PUBLISH: u8 = 0x01;

/// Separates topic from subtopic
pub const TOPIC_SEPARATOR: u8 = b'/';

/// Separates the topic pair from the payload
pub const PAYLOAD_SEPARATOR: u8 = 0x02;

/// Bytes that may not appear inside a topic or subtopic
pub const RESERVED_BYTES: [u8; 3] = [TOPIC_SEPARATOR, CMD_PUBLISH, PAYLOAD_SEPARATOR];

/// Matches any value in its field position
pub const WILDCARD: &str = "#";

/// Maximum length of a topic or subtopic in bytes
pub const MAX_FIELD_LEN: usize = 512;

/// Largest payload a single UDP datagram can carry over IPv4
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Port the broker listens on unless configured otherwise
pub const DEFAULT_BROKER_PORT: u16 = 8080;

/// Maximum number of registrations held by the broker
pub const DEFAULT_MAX_REGISTRATIONS: usize = 512;

/// How long a subscriber waits for an ACK before resending
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(15);

/// Interval of the continuous publisher
pub const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_secs(10);
