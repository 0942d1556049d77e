//! Live event channel for one room.
//!
//! The backend pushes room events as server-sent events. This module splits
//! the byte stream into frames, decodes each frame into a
//! [`rpchat_chats::RoomEvent`], and keeps the connection alive across
//! transport failures.

pub mod backoff;
pub mod channel;
pub mod frame;

pub use backoff::Backoff;
pub use channel::{ChannelStatus, ChannelUpdate, LiveChannel};
pub use frame::{SseDecoder, SseFrame};
