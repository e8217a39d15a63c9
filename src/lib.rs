//! # Skillshare Chat
//!
//! Real-time chat delivery and presence for the skill-sharing marketplace:
//! - WebSocket gateway with bearer-token authentication
//! - Personal and conversation rooms for event fan-out
//! - Heartbeat-driven presence with a liveness sweep
//! - Read receipts propagated to the original senders
//! - Idempotent message creation and client-side delivery dedup
//!
//! ## Architecture
//!
//! - **Domain Layer**: entities, value objects, events and repository traits
//! - **Application Layer**: auth, messaging, presence and read-receipt services
//! - **Infrastructure Layer**: PostgreSQL and in-memory stores, metrics
//! - **Presentation Layer**: HTTP handlers and the WebSocket gateway
//! - **Client**: delivery filter, chat state and reconnect policy
//!
//! ## Module Structure
//!
//! ```text
//! skillshare_chat/
//! +-- config/         Configuration management
//! +-- domain/         Entities, value objects, events
//! +-- application/    Services and DTOs
//! +-- infrastructure/ Database, repositories, metrics
//! +-- presentation/   HTTP routes and WebSocket gateway
//! +-- client/         Client-side state and policies
//! +-- shared/         Errors and validation helpers
//! ```
//!
//! All registries live in one process. Running several instances would need
//! a shared store for presence and a broker for room fan-out.

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Client-side chat state
pub mod client;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
