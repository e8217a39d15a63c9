//! Realtime events and the fan-out port.
//!
//! `ChatEvent` is the closed set of events the server pushes to sockets.
//! Frames are adjacently tagged: `{"event": "new_message", "data": {...}}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entities::Message;
use super::value_objects::{ConversationId, Room};

/// Server to client events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ChatEvent {
    /// Sent once to a freshly authenticated connection.
    Ready(ReadyPayload),
    HeartbeatAck,
    UserOnline(PresencePayload),
    UserOffline(PresencePayload),
    UserJoinedConversation(JoinedConversationPayload),
    UserTyping(TypingPayload),
    NewMessage(NewMessagePayload),
    MessagesRead(MessagesReadPayload),
    Notification(serde_json::Value),
    SessionUpdated(serde_json::Value),
    SessionDeleted(serde_json::Value),
    MeetingStatusUpdated(serde_json::Value),
    /// A client frame was rejected.
    Error(ErrorPayload),
}

impl ChatEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ChatEvent::Ready(_) => "ready",
            ChatEvent::HeartbeatAck => "heartbeat_ack",
            ChatEvent::UserOnline(_) => "user_online",
            ChatEvent::UserOffline(_) => "user_offline",
            ChatEvent::UserJoinedConversation(_) => "user_joined_conversation",
            ChatEvent::UserTyping(_) => "user_typing",
            ChatEvent::NewMessage(_) => "new_message",
            ChatEvent::MessagesRead(_) => "messages_read",
            ChatEvent::Notification(_) => "notification",
            ChatEvent::SessionUpdated(_) => "session_updated",
            ChatEvent::SessionDeleted(_) => "session_deleted",
            ChatEvent::MeetingStatusUpdated(_) => "meeting_status_updated",
            ChatEvent::Error(_) => "error",
        }
    }

    pub fn online(user_id: Uuid, last_seen: DateTime<Utc>) -> Self {
        ChatEvent::UserOnline(PresencePayload {
            user_id,
            is_online: true,
            last_seen,
        })
    }

    pub fn offline(user_id: Uuid, last_seen: DateTime<Utc>) -> Self {
        ChatEvent::UserOffline(PresencePayload {
            user_id,
            is_online: false,
            last_seen,
        })
    }

    pub fn new_message(message: Message) -> Self {
        ChatEvent::NewMessage(NewMessagePayload { message })
    }

    pub fn error(message: impl Into<String>) -> Self {
        ChatEvent::Error(ErrorPayload {
            message: message.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyPayload {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub heartbeat_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresencePayload {
    pub user_id: Uuid,
    pub is_online: bool,
    pub last_seen: DateTime<Utc>,
}

/// Minimal user card attached to conversation events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedConversationPayload {
    pub conversation_id: ConversationId,
    pub user: UserSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub conversation_id: ConversationId,
    pub user_id: Uuid,
    pub user_name: String,
    pub is_typing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessagePayload {
    pub message: Message,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesReadPayload {
    pub conversation_id: ConversationId,
    pub reader_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// Fan-out port used by application services.
///
/// Implemented by the WebSocket gateway. Delivery is fire-and-forget: a
/// target with no live members simply receives nothing.
pub trait RealtimeHub: Send + Sync {
    /// Deliver to every connection in `room`.
    fn emit_to(&self, room: &Room, event: ChatEvent);

    /// Deliver to every connection in `room` except `except_session`.
    fn emit_to_except(&self, room: &Room, event: ChatEvent, except_session: Uuid);

    /// Deliver to every connected client.
    fn broadcast(&self, event: ChatEvent);

    /// Drop the user's connection record if it was established no later
    /// than `last_seen`. A record from a newer connection is kept. Returns
    /// whether a record was dropped.
    fn evict(&self, user_id: Uuid, last_seen: DateTime<Utc>) -> bool;
}
