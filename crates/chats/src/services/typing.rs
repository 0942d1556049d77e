//! Participants currently composing a message.

use std::time::{Duration, Instant};

use crate::types::ParticipantId;

/// Ephemeral typing set.
///
/// Entries clear when the participant's message arrives. Without an expiry a
/// participant that stops without sending stays marked until its next message.
#[derive(Debug, Clone, Default)]
pub struct TypingTracker {
    entries: Vec<(ParticipantId, Instant)>,
    expiry: Option<Duration>,
}

impl TypingTracker {
    pub fn new(expiry: Option<Duration>) -> Self {
        Self {
            entries: Vec::new(),
            expiry,
        }
    }

    /// Record a typing signal. Returns whether the participant was newly added;
    /// a repeat signal only refreshes the entry's age.
    pub fn mark_typing(&mut self, participant_id: ParticipantId, now: Instant) -> bool {
        match self.entries.iter_mut().find(|(id, _)| *id == participant_id) {
            Some(entry) => {
                entry.1 = now;
                false
            }
            None => {
                self.entries.push((participant_id, now));
                true
            }
        }
    }

    /// A message from this participant means it finished composing.
    pub fn message_arrived(&mut self, participant_id: ParticipantId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(id, _)| *id != participant_id);
        self.entries.len() != before
    }

    /// Drop entries older than the configured expiry and return their ids.
    pub fn expire(&mut self, now: Instant) -> Vec<ParticipantId> {
        let Some(expiry) = self.expiry else {
            return Vec::new();
        };

        let mut expired = Vec::new();
        self.entries.retain(|(id, since)| {
            let stale = now.saturating_duration_since(*since) >= expiry;
            if stale {
                expired.push(*id);
            }
            !stale
        });
        expired
    }

    pub fn contains(&self, participant_id: ParticipantId) -> bool {
        self.entries.iter().any(|(id, _)| *id == participant_id)
    }

    /// Typing participants in the order they started.
    pub fn participants(&self) -> Vec<ParticipantId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
