//! In-memory session state for one room.
//!
//! Both stores are plain owned values; the session that holds them decides
//! how access is serialised.

pub mod transcript;
pub mod typing;

pub use transcript::{OrderingPolicy, TranscriptStore};
pub use typing::TypingTracker;
