//! Client-side chat support.
//!
//! State and policies a chat client needs on top of the raw gateway frames:
//! delivery deduplication, the folded conversation state, and reconnect
//! backoff.

pub mod dedup;
pub mod reconnect;
pub mod session;

pub use dedup::DeliveryFilter;
pub use reconnect::{ConnectionStatus, ReconnectPolicy};
pub use session::{ChatSession, OutgoingMessage, PresenceEntry, SendStatus};
