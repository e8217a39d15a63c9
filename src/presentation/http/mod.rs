//! HTTP API
//!
//! REST routes that sit next to the gateway.

pub mod handlers;
pub mod routes;
