//! # rpchat Chats Crate
//!
//! Domain model for one room's live chat session: the entities the roleplay
//! backend serves, the events it pushes, and the in-memory state a session
//! keeps in sync with them.
//!
//! ## Architecture
//!
//! - **Entities**: Room, Participant, Message, LogRecord, DecisionStep
//! - **Types**: room events, request/response bodies, errors
//! - **Services**: transcript store and typing tracker
//! - **Utils**: input validation and display helpers
//!
//! ## Usage
//!
//! ```rust
//! use rpchat_chats::{RoomEvent, TranscriptStore, TypingTracker};
//!
//! let mut transcript = TranscriptStore::default();
//! let mut typing = TypingTracker::default();
//!
//! let event = RoomEvent::decode(r#"{"type":"typing","participant_id":7}"#).unwrap();
//! event.apply(&mut transcript, &mut typing, std::time::Instant::now());
//! assert!(typing.contains(7));
//! ```

pub mod entities;
pub mod services;
pub mod types;
pub mod utils;

pub use entities::{
    CallOutcome, CallType, DecisionStep, LogRecord, Message, Participant, ParticipantType, Room,
    Roster, StepType,
};
pub use services::{OrderingPolicy, TranscriptStore, TypingTracker};
pub use types::{
    ChatError, ChatResult, DecisionsResponse, EditMessageRequest, LlmLogsResponse, MessageId,
    ParticipantId, RegenerateResponse, RoomEvent, RoomId, SendMessageRequest,
};
