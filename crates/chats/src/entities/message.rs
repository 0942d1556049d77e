use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::participant::{badge, ParticipantType};
use crate::types::{MessageId, ParticipantId, RoomId};

/// A single line of the room transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    #[serde(default)]
    pub room_id: RoomId,
    /// Authoring participant
    pub participant_id: ParticipantId,
    #[serde(default)]
    pub participant_name: String,
    #[serde(default)]
    pub participant_avatar: String,
    pub content: String,
    /// Derived by the backend from the author's participant type
    #[serde(default)]
    pub is_ai: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_type: Option<ParticipantType>,
}

impl Message {
    /// Human-authored messages are rendered on the operator's side and are
    /// the ones that trigger orchestration, so they carry introspection data.
    pub fn is_human(&self) -> bool {
        match self.participant_type {
            Some(participant_type) => participant_type == ParticipantType::Human,
            None => !self.is_ai,
        }
    }

    pub fn is_inspectable(&self) -> bool {
        self.is_human()
    }

    pub fn badge(&self) -> String {
        badge(&self.participant_avatar, &self.participant_name)
    }

    /// Ordering key for timestamp-ordered transcripts.
    pub(crate) fn sort_key(&self) -> (DateTime<Utc>, MessageId) {
        (self.created_at, self.id)
    }
}
