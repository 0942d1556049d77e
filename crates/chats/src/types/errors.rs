//! Error types for the chat domain.

use thiserror::Error;

use super::MessageId;

/// Result type alias for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Main error type for the chat domain
#[derive(Debug, Error, PartialEq)]
pub enum ChatError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Message not found: {id}")]
    MessageNotFound { id: MessageId },

    #[error("Unknown event type: {kind}")]
    UnknownEvent { kind: String },

    #[error("Malformed event: {message}")]
    MalformedEvent { message: String },
}

impl ChatError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error for messages
    pub fn message_not_found(id: MessageId) -> Self {
        Self::MessageNotFound { id }
    }

    pub fn unknown_event(kind: impl Into<String>) -> Self {
        Self::UnknownEvent { kind: kind.into() }
    }

    pub fn malformed_event(message: impl Into<String>) -> Self {
        Self::MalformedEvent {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedEvent {
            message: err.to_string(),
        }
    }
}
