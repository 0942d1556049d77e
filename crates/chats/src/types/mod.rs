//! Shared types: identifiers, wire bodies, events and errors.

pub mod errors;
pub mod events;
pub mod requests;
pub mod responses;

pub use errors::{ChatError, ChatResult};
pub use events::RoomEvent;
pub use requests::*;
pub use responses::*;

// Common type aliases
pub type RoomId = i64;
pub type MessageId = i64;
pub type ParticipantId = i64;
