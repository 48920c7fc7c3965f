//! Topic filters and topic names
//!
//! A subscriber registers a [`TopicFilter`], whose fields may be the `#`
//! wildcard. A publisher addresses a [`TopicName`], whose fields are always
//! literal. Both validate on construction, so an empty, oversized or
//! separator-containing field never reaches the registry or the wire.

use std::fmt;

use crate::error::{Field, ValidationError};

use super::constants::{MAX_FIELD_LEN, RESERVED_BYTES, TOPIC_SEPARATOR, WILDCARD};

fn validate_field(field: Field, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    if value.len() > MAX_FIELD_LEN {
        return Err(ValidationError::TooLong {
            field,
            len: value.len(),
            max: MAX_FIELD_LEN,
        });
    }
    if let Some(&byte) = value.as_bytes().iter().find(|b| RESERVED_BYTES.contains(b)) {
        return Err(ValidationError::ReservedByte { field, byte });
    }
    Ok(())
}

fn field_matches(filter: &str, value: &str) -> bool {
    filter == WILDCARD || filter == value
}

fn split_once(s: &str) -> Option<(&str, &str)> {
    s.split_once(TOPIC_SEPARATOR as char)
}

/// Subscription filter (topic + subtopic, either may be `#`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicFilter {
    topic: String,
    subtopic: String,
}

impl TopicFilter {
    /// Create a filter from its two fields
    pub fn new(
        topic: impl Into<String>,
        subtopic: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let topic = topic.into();
        let subtopic = subtopic.into();
        validate_field(Field::Topic, &topic)?;
        validate_field(Field::Subtopic, &subtopic)?;
        Ok(Self { topic, subtopic })
    }

    /// Parse `topic[/subtopic]`, defaulting the subtopic to the wildcard
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match split_once(s) {
            Some((topic, subtopic)) => Self::new(topic, subtopic),
            None => Self::new(s, WILDCARD),
        }
    }

    /// Filter matching every message
    pub fn any() -> Self {
        Self {
            topic: WILDCARD.to_string(),
            subtopic: WILDCARD.to_string(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn subtopic(&self) -> &str {
        &self.subtopic
    }

    /// Check whether a published topic pair is selected by this filter
    ///
    /// Both fields must match independently. A wildcard topic does not
    /// imply a wildcard subtopic.
    pub fn matches(&self, topic: &str, subtopic: &str) -> bool {
        field_matches(&self.topic, topic) && field_matches(&self.subtopic, subtopic)
    }

    /// Literal comparison of both fields, wildcards included
    pub fn is(&self, topic: &str, subtopic: &str) -> bool {
        self.topic == topic && self.subtopic == subtopic
    }
}

impl fmt::Display for TopicFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.topic, self.subtopic)
    }
}

/// Literal topic a message is published to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicName {
    topic: String,
    subtopic: String,
}

impl TopicName {
    /// Create a topic name, rejecting wildcards
    pub fn new(
        topic: impl Into<String>,
        subtopic: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let topic = topic.into();
        let subtopic = subtopic.into();
        validate_field(Field::Topic, &topic)?;
        validate_field(Field::Subtopic, &subtopic)?;
        if topic == WILDCARD {
            return Err(ValidationError::Wildcard(Field::Topic));
        }
        if subtopic == WILDCARD {
            return Err(ValidationError::Wildcard(Field::Subtopic));
        }
        Ok(Self { topic, subtopic })
    }

    /// Parse `topic/subtopic`; the subtopic is mandatory
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match split_once(s) {
            Some((topic, subtopic)) => Self::new(topic, subtopic),
            None => {
                validate_field(Field::Topic, s)?;
                Err(ValidationError::Empty(Field::Subtopic))
            }
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn subtopic(&self) -> &str {
        &self.subtopic
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.topic, self.subtopic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_parse_defaults_subtopic_to_wildcard() {
        let filter = TopicFilter::parse("weather").unwrap();
        assert_eq!(filter.topic(), "weather");
        assert_eq!(filter.subtopic(), WILDCARD);

        let filter = TopicFilter::parse("time/germany").unwrap();
        assert_eq!(filter.topic(), "time");
        assert_eq!(filter.subtopic(), "germany");
        assert_eq!(filter.to_string(), "time/germany");
    }

    #[test]
    fn test_filter_rejects_empty_fields() {
        assert_eq!(
            TopicFilter::new("", "x"),
            Err(ValidationError::Empty(Field::Topic))
        );
        assert_eq!(
            TopicFilter::parse("time/"),
            Err(ValidationError::Empty(Field::Subtopic))
        );
        assert_eq!(
            TopicFilter::parse("/germany"),
            Err(ValidationError::Empty(Field::Topic))
        );
    }

    #[test]
    fn test_field_length_limit() {
        let at_limit = "a".repeat(MAX_FIELD_LEN);
        assert!(TopicFilter::new(at_limit.clone(), "x").is_ok());

        let over = "a".repeat(MAX_FIELD_LEN + 1);
        assert_eq!(
            TopicFilter::new("x", over),
            Err(ValidationError::TooLong {
                field: Field::Subtopic,
                len: MAX_FIELD_LEN + 1,
                max: MAX_FIELD_LEN,
            })
        );
    }

    #[test]
    fn test_reserved_bytes_rejected() {
        assert_eq!(
            TopicFilter::parse("a/b/c"),
            Err(ValidationError::ReservedByte {
                field: Field::Subtopic,
                byte: b'/',
            })
        );
        assert!(TopicName::new("a\u{2}", "b").is_err());
        assert!(TopicName::new("a", "\u{1}b").is_err());
    }

    #[test]
    fn test_wildcard_and_semantics() {
        let filter = TopicFilter::new("#", "x").unwrap();
        assert!(filter.matches("a", "x"));
        assert!(filter.matches("b", "x"));
        assert!(!filter.matches("a", "y"));

        let any = TopicFilter::any();
        assert!(any.matches("a", "x"));
        assert!(any.matches("weather", "berlin"));
    }

    #[test]
    fn test_wildcard_is_whole_field_only() {
        let filter = TopicFilter::new("wea#", "#").unwrap();
        assert!(filter.matches("wea#", "berlin"));
        assert!(!filter.matches("weather", "berlin"));
    }

    #[test]
    fn test_topic_name_rejects_wildcards() {
        assert_eq!(
            TopicName::new("#", "x"),
            Err(ValidationError::Wildcard(Field::Topic))
        );
        assert_eq!(
            TopicName::parse("weather/#"),
            Err(ValidationError::Wildcard(Field::Subtopic))
        );
    }

    #[test]
    fn test_topic_name_requires_subtopic() {
        assert_eq!(
            TopicName::parse("weather"),
            Err(ValidationError::Empty(Field::Subtopic))
        );
        assert_eq!(
            TopicName::parse(""),
            Err(ValidationError::Empty(Field::Topic))
        );
        assert!(TopicName::parse("weather/berlin").is_ok());
    }
}
