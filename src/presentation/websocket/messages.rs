//! WebSocket Message Types
//!
//! Client-to-server frames. Outgoing frames are `domain::ChatEvent`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ConversationId;

/// Incoming gateway frame: `{"event": "...", "data": {...}}`.
///
/// Anything that does not match one of these shapes is rejected at the
/// boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Heartbeat,
    JoinConversation(JoinConversationPayload),
    Typing(TypingPayload),
    MessageRead(MessageReadPayload),
}

impl ClientEvent {
    /// Parse a text frame.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JoinConversationPayload {
    pub conversation_id: ConversationId,
    pub other_user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypingPayload {
    pub conversation_id: ConversationId,
    pub is_typing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MessageReadPayload {
    pub conversation_id: ConversationId,
    pub reader_id: Uuid,
}
