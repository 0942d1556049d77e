//! Validation utilities.

use crate::types::{ChatError, ChatResult};

const MAX_CONTENT_LEN: usize = 100_000;

/// Validation utilities
pub struct Validator;

impl Validator {
    /// Validate message content before it is submitted.
    ///
    /// Content is sent as typed; only blank input is rejected.
    pub fn message_content(content: &str) -> ChatResult<()> {
        if content.trim().is_empty() {
            return Err(ChatError::validation("Message content cannot be empty"));
        }

        if content.len() > MAX_CONTENT_LEN {
            return Err(ChatError::validation(
                "Message content too long (max 100,000 characters)",
            ));
        }

        Ok(())
    }
}
