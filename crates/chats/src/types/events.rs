//! Events pushed by the backend on a room's live channel.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatError, ChatResult, MessageId, ParticipantId};
use crate::entities::Message;
use crate::services::{TranscriptStore, TypingTracker};

const KNOWN_EVENT_TYPES: &[&str] = &["message", "typing", "message_edited", "message_deleted"];

/// Main room event type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    /// A message was posted, by the operator or by an AI participant
    Message { message: Message },

    /// A participant started composing
    Typing { participant_id: ParticipantId },

    /// Message content was replaced
    MessageEdited {
        message_id: MessageId,
        content: String,
    },

    /// Message was deleted
    MessageDeleted { message_id: MessageId },
}

impl RoomEvent {
    /// Decode one event record.
    ///
    /// Unknown `type` values and payloads that do not match their type are
    /// reported as distinct errors so callers can log them differently.
    pub fn decode(data: &str) -> ChatResult<Self> {
        let value: serde_json::Value = serde_json::from_str(data)?;

        let kind = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| ChatError::malformed_event("missing type discriminant"))?;

        if !KNOWN_EVENT_TYPES.contains(&kind) {
            return Err(ChatError::unknown_event(kind));
        }

        serde_json::from_value(value).map_err(ChatError::from)
    }

    /// Get event type name for logging
    pub fn event_type_name(&self) -> &'static str {
        match self {
            RoomEvent::Message { .. } => "message",
            RoomEvent::Typing { .. } => "typing",
            RoomEvent::MessageEdited { .. } => "message_edited",
            RoomEvent::MessageDeleted { .. } => "message_deleted",
        }
    }

    /// Apply the event to a session's transcript and typing set.
    ///
    /// Returns whether any visible state changed. Events about messages the
    /// transcript does not hold are no-ops.
    pub fn apply(
        self,
        transcript: &mut TranscriptStore,
        typing: &mut TypingTracker,
        now: Instant,
    ) -> bool {
        match self {
            RoomEvent::Message { message } => {
                let author = message.participant_id;
                let cleared = typing.message_arrived(author);
                let appended = transcript.append(message);
                appended || cleared
            }
            RoomEvent::Typing { participant_id } => typing.mark_typing(participant_id, now),
            RoomEvent::MessageEdited {
                message_id,
                content,
            } => {
                let changed = transcript.replace_content(message_id, content);
                if !changed {
                    debug!(message_id, "edit for message not in transcript ignored");
                }
                changed
            }
            RoomEvent::MessageDeleted { message_id } => {
                let removed = transcript.remove(message_id);
                if !removed {
                    debug!(message_id, "delete for message not in transcript ignored");
                }
                removed
            }
        }
    }
}
