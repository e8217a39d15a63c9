//! # Domain Entities
//!
//! Persisted objects the chat layer depends on.
//!
//! - **User**: identity, display name and persisted presence
//! - **Message**: a direct message inside one conversation
//!
//! Each entity has an associated repository trait; implementations live in
//! the infrastructure layer.

mod message;
mod user;

pub use message::{Attachment, Message, MessageRepository};
pub use user::{User, UserRepository};

#[cfg(test)]
pub use message::MockMessageRepository;
#[cfg(test)]
pub use user::MockUserRepository;
