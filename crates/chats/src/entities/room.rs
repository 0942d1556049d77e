use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::RoomId;

/// A chat context whose setting is shared by every participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Free-text scene description shown above the transcript
    #[serde(default)]
    pub setting: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
