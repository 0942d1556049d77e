//! Domain entities served by the roleplay backend.
//!
//! These mirror the JSON the backend emits. They are read-only from the
//! session's point of view except for message content, which changes only
//! through server-pushed events.

pub mod introspection;
pub mod message;
pub mod participant;
pub mod room;

pub use introspection::{CallOutcome, CallType, DecisionStep, LogRecord, StepType};
pub use message::Message;
pub use participant::{Participant, ParticipantType, Roster};
pub use room::Room;
