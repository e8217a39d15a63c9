//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints.

pub mod conversation;
pub mod health;
pub mod message;
pub mod presence;
