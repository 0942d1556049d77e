//! REST endpoints of the roleplay backend, grouped by resource.
//!
//! Mutations return pass/fail only. Their visible effects reach the client
//! through the room's live channel.

pub mod chat;
pub mod introspection;
pub mod message;
pub mod room;
