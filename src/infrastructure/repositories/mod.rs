//! Repository Implementations
//!
//! Concrete implementations of the domain repository traits.
//!
//! ## Available Repositories
//!
//! - **PgUserRepository** / **PgMessageRepository** - PostgreSQL via sqlx
//! - **InMemoryUserRepository** / **InMemoryMessageRepository** - process-local
//!   stores used when no database is configured, and by tests
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use skillshare_chat::domain::MessageRepository;
//! use skillshare_chat::infrastructure::repositories::PgMessageRepository;
//!
//! let messages: Arc<dyn MessageRepository> = Arc::new(PgMessageRepository::new(pool));
//! ```

pub mod memory;
pub mod message_repository;
pub mod user_repository;

pub use memory::{InMemoryMessageRepository, InMemoryUserRepository};
pub use message_repository::PgMessageRepository;
pub use user_repository::PgUserRepository;
