//! # Domain Layer
//!
//! Core types of the chat delivery layer, independent of transport and
//! storage.
//!
//! ## Structure
//!
//! - **entities**: persisted User and Message plus their repository traits
//! - **value_objects**: ConversationId and Room
//! - **events**: the server-to-client event set and the `RealtimeHub` port

pub mod entities;
pub mod events;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use events::{ChatEvent, RealtimeHub};
pub use value_objects::*;
