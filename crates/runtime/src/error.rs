//! Errors surfaced to the user by session commands.

use rpchat_chats::{ChatError, MessageId};
use rpchat_gateway::GatewayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("A message is already being sent")]
    SendInFlight,

    #[error("Cancelled")]
    NotConfirmed,

    #[error("{0}")]
    Validation(#[from] ChatError),

    #[error(
        "Message {} cannot be regenerated; only the latest message you sent can be",
        .message_id.map_or_else(String::new, |id| id.to_string())
    )]
    NotRegenerable { message_id: Option<MessageId> },

    #[error("No room is open")]
    NoActiveSession,

    /// The session closed while the command was in flight; its result no
    /// longer applies to what is on screen.
    #[error("The room was closed before the request finished")]
    Stale,

    #[error("Request failed: {0}")]
    Request(#[from] GatewayError),
}

impl CommandError {
    pub fn validation(message: impl Into<String>) -> Self {
        CommandError::Validation(ChatError::validation(message))
    }

    /// Text for a status line.
    pub fn user_message(&self) -> String {
        match self {
            CommandError::Request(GatewayError::Status { message, .. }) => message.clone(),
            CommandError::NotRegenerable { message_id: None } => {
                "There is no message of yours to regenerate from".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;
