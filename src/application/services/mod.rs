//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **AuthService**: bearer JWT verification
//! - **MessageService**: idempotent message creation and history
//! - **PresenceTracker**: heartbeats, liveness sweep, online/offline events
//! - **ReadReceiptService**: batch mark-read and per-sender receipts

pub mod auth_service;
pub mod message_service;
pub mod presence_service;
pub mod read_receipt_service;

pub use auth_service::{AuthError, AuthService, Claims};
pub use message_service::{
    CreateMessageDto, MessageError, MessageService, MessageServiceImpl, SendOutcome,
};
pub use presence_service::{HeartbeatOutcome, PresenceTracker};
pub use read_receipt_service::{ReadReceipt, ReadReceiptService};
