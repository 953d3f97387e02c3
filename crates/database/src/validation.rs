//! Input validation for ping messages and group topics.

use std::fmt;

pub use ping_core::api::MAX_MESSAGE_LENGTH;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Empty value where one is required.
    Empty(String),
    /// Topic contains characters push providers reject.
    InvalidTopic(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::InvalidTopic(topic) => write!(f, "Invalid topic: {}", topic),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for topic names.
pub const MAX_TOPIC_LENGTH: usize = 900;

/// Validate a ping message.
///
/// Messages must be non-empty and at most [`MAX_MESSAGE_LENGTH`] characters.
pub fn validate_message(message: &str) -> Result<(), ValidationError> {
    if message.trim().is_empty() {
        return Err(ValidationError::Empty("message".to_string()));
    }

    let len = message.chars().count();
    if len > MAX_MESSAGE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "message".to_string(),
            max: MAX_MESSAGE_LENGTH,
            actual: len,
        });
    }

    Ok(())
}

/// Validate a group-ping topic.
///
/// Topics follow the push-provider rule `[a-zA-Z0-9-_.~%]+`.
pub fn validate_topic(topic: &str) -> Result<(), ValidationError> {
    if topic.is_empty() {
        return Err(ValidationError::Empty("topic".to_string()));
    }

    if topic.len() > MAX_TOPIC_LENGTH {
        return Err(ValidationError::TooLong {
            field: "topic".to_string(),
            max: MAX_TOPIC_LENGTH,
            actual: topic.len(),
        });
    }

    let valid = topic
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | '%'));
    if !valid {
        return Err(ValidationError::InvalidTopic(topic.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_bounds() {
        assert!(validate_message("Hi").is_ok());
        assert!(validate_message(&"é".repeat(200)).is_ok());
        assert_eq!(
            validate_message("   "),
            Err(ValidationError::Empty("message".to_string()))
        );
        assert!(matches!(
            validate_message(&"x".repeat(201)),
            Err(ValidationError::TooLong { actual: 201, .. })
        ));
    }

    #[test]
    fn test_topics() {
        assert!(validate_topic("hardware").is_ok());
        assert!(validate_topic("team-a_1.x~%").is_ok());
        assert!(validate_topic("").is_err());
        assert_eq!(
            validate_topic("two words"),
            Err(ValidationError::InvalidTopic("two words".to_string()))
        );
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::TooLong {
            field: "message".to_string(),
            max: 200,
            actual: 250,
        };
        assert_eq!(err.to_string(), "message is too long (250 chars, max 200)");
    }
}
