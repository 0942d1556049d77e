use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ParticipantId, RoomId};

/// Whether a participant is voiced by the orchestrator or by a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantType {
    Ai,
    Human,
}

/// A character bound to a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    #[serde(default)]
    pub room_id: RoomId,
    pub character_id: i64,
    pub character_name: String,
    #[serde(default)]
    pub character_avatar: String,
    pub participant_type: ParticipantType,
    /// Marks the local operator's identity in this room
    #[serde(default)]
    pub is_user: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Participant {
    pub fn is_ai(&self) -> bool {
        self.participant_type == ParticipantType::Ai
    }

    /// Avatar glyph, or the first letter of the character name when none is set.
    pub fn badge(&self) -> String {
        badge(&self.character_avatar, &self.character_name)
    }
}

pub(crate) fn badge(avatar: &str, name: &str) -> String {
    if !avatar.trim().is_empty() {
        return avatar.to_string();
    }
    name.chars().next().map(String::from).unwrap_or_default()
}

/// The participant list of one room, as fetched when a session opens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    pub fn new(participants: Vec<Participant>) -> Self {
        Self { participants }
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// The participant the local operator is playing, if any.
    ///
    /// At most one participant per room carries the flag; if the backend ever
    /// reports more, the first one wins.
    pub fn acting(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.is_user)
    }

    pub fn display_name(&self, id: ParticipantId) -> String {
        self.get(id)
            .map(|p| p.character_name.clone())
            .unwrap_or_else(|| format!("participant #{id}"))
    }

    /// "X is typing..." lines for the given participants, in the given order.
    pub fn typing_labels(&self, ids: &[ParticipantId]) -> Vec<String> {
        ids.iter()
            .map(|id| format!("{} is typing...", self.display_name(*id)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(id: ParticipantId, name: &str, kind: ParticipantType, is_user: bool) -> Participant {
        Participant {
            id,
            room_id: 1,
            character_id: id * 10,
            character_name: name.to_string(),
            character_avatar: String::new(),
            participant_type: kind,
            is_user,
            created_at: None,
        }
    }

    #[test]
    fn acting_participant_is_the_first_flagged_one() {
        let roster = Roster::new(vec![
            participant(1, "Narrator", ParticipantType::Ai, false),
            participant(2, "Aria", ParticipantType::Human, true),
            participant(3, "Bram", ParticipantType::Human, true),
        ]);

        assert_eq!(roster.acting().map(|p| p.id), Some(2));
    }

    #[test]
    fn typing_labels_fall_back_for_unknown_ids() {
        let roster = Roster::new(vec![participant(4, "Mira", ParticipantType::Ai, false)]);

        assert_eq!(
            roster.typing_labels(&[4, 9]),
            vec!["Mira is typing...".to_string(), "participant #9 is typing...".to_string()]
        );
    }

    #[test]
    fn badge_prefers_avatar_over_initial() {
        let mut p = participant(1, "Odo", ParticipantType::Ai, false);
        assert_eq!(p.badge(), "O");
        p.character_avatar = "🦊".to_string();
        assert_eq!(p.badge(), "🦊");
    }

    #[test]
    fn participant_type_uses_lowercase_wire_names() {
        let parsed: ParticipantType = serde_json::from_str("\"human\"").unwrap();
        assert_eq!(parsed, ParticipantType::Human);
    }
}
