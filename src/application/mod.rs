//! Application Layer
//!
//! Services that orchestrate the domain types and the realtime hub, plus
//! the DTOs used at the HTTP boundary.

pub mod dto;
pub mod services;
