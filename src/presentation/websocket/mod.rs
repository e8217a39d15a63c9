//! WebSocket Gateway
//!
//! Real-time delivery over WebSocket connections.

pub mod gateway;
pub mod handler;
pub mod messages;
pub mod rooms;
pub mod session;

pub use gateway::{ConnectionRecord, Gateway};
pub use handler::{close_session, handle_message, open_session, process_frame, ws_handler};
pub use messages::ClientEvent;
pub use rooms::RoomRegistry;
pub use session::SessionState;
