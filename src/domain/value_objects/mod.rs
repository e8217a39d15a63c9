//! # Value Objects
//!
//! Immutable value types used throughout the domain.
//!
//! - **ConversationId**: order-independent id of a two-party conversation
//! - **Room**: fan-out group addressed by the realtime hub

mod conversation_id;
mod room;

pub use conversation_id::{ConversationId, ConversationIdError};
pub use room::Room;
