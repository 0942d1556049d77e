//! Ordered message log for one room.

use std::collections::HashSet;

use crate::entities::Message;
use crate::types::MessageId;

/// How newly appended messages are positioned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderingPolicy {
    /// Append at the end, in the order messages reach the client.
    #[default]
    Arrival,
    /// Insert by `created_at`, breaking ties by message id.
    Timestamp,
}

/// The transcript of the active room.
///
/// Message identities are unique: a message delivered by both the initial
/// fetch and the live channel is stored once.
#[derive(Debug, Clone, Default)]
pub struct TranscriptStore {
    messages: Vec<Message>,
    ids: HashSet<MessageId>,
    policy: OrderingPolicy,
}

impl TranscriptStore {
    pub fn new(policy: OrderingPolicy) -> Self {
        Self {
            messages: Vec::new(),
            ids: HashSet::new(),
            policy,
        }
    }

    pub fn policy(&self) -> OrderingPolicy {
        self.policy
    }

    /// Insert-or-ignore by identity. Returns whether the message was added.
    pub fn append(&mut self, message: Message) -> bool {
        if !self.ids.insert(message.id) {
            return false;
        }

        match self.policy {
            OrderingPolicy::Arrival => self.messages.push(message),
            OrderingPolicy::Timestamp => {
                let key = message.sort_key();
                let position = self.messages.partition_point(|m| m.sort_key() <= key);
                self.messages.insert(position, message);
            }
        }
        true
    }

    /// Seed from a snapshot fetch, keeping anything the live channel already delivered.
    ///
    /// Returns how many messages were new.
    pub fn load(&mut self, messages: impl IntoIterator<Item = Message>) -> usize {
        messages
            .into_iter()
            .map(|message| self.append(message))
            .filter(|added| *added)
            .count()
    }

    /// Replace content in place. Absent ids are a silent no-op since an edit
    /// can race the message's deletion.
    pub fn replace_content(&mut self, id: MessageId, content: impl Into<String>) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.content = content.into();
                true
            }
            None => false,
        }
    }

    /// Remove the message with this id if present. Idempotent.
    pub fn remove(&mut self, id: MessageId) -> bool {
        if !self.ids.remove(&id) {
            return false;
        }
        self.messages.retain(|m| m.id != id);
        true
    }

    pub fn reset(&mut self) {
        self.messages.clear();
        self.ids.clear();
    }

    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recent human-authored message, the only one regenerate applies to.
    pub fn latest_human_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.is_human())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn message(id: MessageId, minute: u32, is_ai: bool) -> Message {
        Message {
            id,
            room_id: 1,
            participant_id: if is_ai { 2 } else { 1 },
            participant_name: if is_ai { "Narrator" } else { "Aria" }.to_string(),
            participant_avatar: String::new(),
            content: format!("message {id}"),
            is_ai,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap(),
            participant_type: None,
        }
    }

    fn ids(store: &TranscriptStore) -> Vec<MessageId> {
        store.snapshot().iter().map(|m| m.id).collect()
    }

    #[test]
    fn append_ignores_duplicate_identities() {
        let mut store = TranscriptStore::default();

        assert!(store.append(message(1, 0, false)));
        assert!(!store.append(message(1, 0, false)));
        assert!(store.append(message(2, 1, true)));

        assert_eq!(ids(&store), vec![1, 2]);
    }

    #[test]
    fn arrival_policy_keeps_out_of_order_messages_where_they_land() {
        let mut store = TranscriptStore::new(OrderingPolicy::Arrival);
        store.append(message(2, 5, true));
        store.append(message(1, 1, false));

        assert_eq!(ids(&store), vec![2, 1]);
    }

    #[test]
    fn timestamp_policy_sorts_by_time_then_id() {
        let mut store = TranscriptStore::new(OrderingPolicy::Timestamp);
        store.append(message(5, 3, true));
        store.append(message(3, 1, false));
        store.append(message(4, 3, true));
        store.append(message(1, 9, false));

        assert_eq!(ids(&store), vec![3, 4, 5, 1]);
    }

    #[test]
    fn replace_content_only_touches_present_messages() {
        let mut store = TranscriptStore::default();
        store.append(message(1, 0, false));

        assert!(store.replace_content(1, "edited"));
        assert_eq!(store.get(1).map(|m| m.content.as_str()), Some("edited"));

        let before = store.snapshot().to_vec();
        assert!(!store.replace_content(42, "nope"));
        assert_eq!(store.snapshot(), before.as_slice());
    }

    #[test]
    fn remove_is_idempotent() {
        let mut store = TranscriptStore::default();
        store.append(message(1, 0, false));
        store.append(message(2, 1, true));

        assert!(store.remove(1));
        let after_first = store.snapshot().to_vec();
        assert!(!store.remove(1));

        assert_eq!(store.snapshot(), after_first.as_slice());
        assert_eq!(ids(&store), vec![2]);
    }

    #[test]
    fn removed_ids_can_arrive_again() {
        let mut store = TranscriptStore::default();
        store.append(message(1, 0, false));
        store.remove(1);

        assert!(store.append(message(1, 0, false)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn load_merges_with_streamed_messages() {
        let mut store = TranscriptStore::default();
        store.append(message(2, 1, true));

        let added = store.load(vec![message(1, 0, false), message(2, 1, true)]);

        assert_eq!(added, 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn reset_empties_everything() {
        let mut store = TranscriptStore::default();
        store.load(vec![message(1, 0, false), message(2, 1, true)]);

        store.reset();

        assert!(store.is_empty());
        assert!(!store.contains(1));
    }

    #[test]
    fn latest_human_message_skips_ai_replies() {
        let mut store = TranscriptStore::default();
        store.load(vec![
            message(1, 0, false),
            message(2, 1, true),
            message(3, 2, false),
            message(4, 3, true),
        ]);

        assert_eq!(store.latest_human_message().map(|m| m.id), Some(3));
    }
}
