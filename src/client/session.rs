//! Client chat state.
//!
//! `ChatSession` folds server events into what a chat screen shows:
//! per-conversation timelines, presence, typing indicators and the status
//! of the user's own outgoing messages.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::dedup::DeliveryFilter;
use crate::domain::{ChatEvent, ConversationId, Message};

/// Last known presence of another user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceEntry {
    pub is_online: bool,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendStatus {
    Pending,
    Sent { message_id: Uuid },
    Failed { reason: String },
}

/// A message submission, ready to be posted to `/api/v1/messages`.
///
/// Retries reuse `client_message_id` so the server can recognise them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub client_message_id: String,
    pub receiver_id: Uuid,
    pub content: String,
}

#[derive(Debug)]
struct PendingSend {
    outgoing: OutgoingMessage,
    status: SendStatus,
}

#[derive(Debug)]
pub struct ChatSession {
    user_id: Uuid,
    session_id: Option<Uuid>,
    heartbeat_interval: Option<Duration>,
    filter: DeliveryFilter,
    timelines: HashMap<ConversationId, Vec<Message>>,
    presence: HashMap<Uuid, PresenceEntry>,
    typing: HashMap<ConversationId, HashSet<Uuid>>,
    sends: HashMap<String, PendingSend>,
    last_error: Option<String>,
}

impl ChatSession {
    pub fn new(user_id: Uuid, delivery_window: Duration) -> Self {
        Self {
            user_id,
            session_id: None,
            heartbeat_interval: None,
            filter: DeliveryFilter::new(delivery_window),
            timelines: HashMap::new(),
            presence: HashMap::new(),
            typing: HashMap::new(),
            sends: HashMap::new(),
            last_error: None,
        }
    }

    /// Apply one server event. Returns false when the event was a redundant
    /// delivery or changed nothing.
    pub fn apply(&mut self, event: ChatEvent, now: Instant) -> bool {
        match event {
            ChatEvent::Ready(ready) => {
                self.session_id = Some(ready.session_id);
                self.heartbeat_interval = Some(Duration::from_millis(ready.heartbeat_interval_ms));
                true
            }
            ChatEvent::HeartbeatAck => false,
            ChatEvent::UserOnline(p) | ChatEvent::UserOffline(p) => {
                if p.user_id == self.user_id {
                    return false;
                }
                let entry = PresenceEntry {
                    is_online: p.is_online,
                    last_seen: p.last_seen,
                };
                self.presence.insert(p.user_id, entry) != Some(entry)
            }
            ChatEvent::UserJoinedConversation(_) => false,
            ChatEvent::UserTyping(p) => {
                let typing = self.typing.entry(p.conversation_id).or_default();
                if p.is_typing {
                    typing.insert(p.user_id)
                } else {
                    typing.remove(&p.user_id)
                }
            }
            ChatEvent::NewMessage(p) => self.receive(p.message, now),
            ChatEvent::MessagesRead(p) => self.mark_read_by(&p.conversation_id, p.reader_id),
            ChatEvent::Error(e) => {
                self.last_error = Some(e.message);
                true
            }
            ChatEvent::Notification(_)
            | ChatEvent::SessionUpdated(_)
            | ChatEvent::SessionDeleted(_)
            | ChatEvent::MeetingStatusUpdated(_) => true,
        }
    }

    /// Start tracking a new outgoing message.
    pub fn queue_send(&mut self, receiver_id: Uuid, content: impl Into<String>) -> OutgoingMessage {
        let outgoing = OutgoingMessage {
            client_message_id: Uuid::new_v4().to_string(),
            receiver_id,
            content: content.into(),
        };
        self.sends.insert(
            outgoing.client_message_id.clone(),
            PendingSend {
                outgoing: outgoing.clone(),
                status: SendStatus::Pending,
            },
        );
        outgoing
    }

    /// The server answered the submission made with `client_message_id`.
    ///
    /// A deduplicated answer may carry an earlier message with another
    /// token; the submission is still settled by it.
    pub fn confirm_sent(&mut self, client_message_id: &str, message: Message, now: Instant) {
        if let Some(send) = self.sends.get_mut(client_message_id) {
            send.status = SendStatus::Sent {
                message_id: message.id,
            };
        }
        self.receive(message, now);
    }

    pub fn fail_send(&mut self, client_message_id: &str, reason: impl Into<String>) {
        if let Some(send) = self.sends.get_mut(client_message_id) {
            send.status = SendStatus::Failed {
                reason: reason.into(),
            };
        }
    }

    /// Put a failed send back to pending and hand it out again.
    pub fn retry(&mut self, client_message_id: &str) -> Option<OutgoingMessage> {
        let send = self.sends.get_mut(client_message_id)?;
        if !matches!(send.status, SendStatus::Failed { .. }) {
            return None;
        }
        send.status = SendStatus::Pending;
        Some(send.outgoing.clone())
    }

    pub fn send_status(&self, client_message_id: &str) -> Option<&SendStatus> {
        self.sends.get(client_message_id).map(|s| &s.status)
    }

    pub fn timeline(&self, conversation_id: &ConversationId) -> &[Message] {
        self.timelines
            .get(conversation_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn presence_of(&self, user_id: Uuid) -> Option<PresenceEntry> {
        self.presence.get(&user_id).copied()
    }

    pub fn is_typing(&self, conversation_id: &ConversationId, user_id: Uuid) -> bool {
        self.typing
            .get(conversation_id)
            .is_some_and(|users| users.contains(&user_id))
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat_interval
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn receive(&mut self, message: Message, now: Instant) -> bool {
        if !self.filter.accept(&message, now) {
            return false;
        }

        if let Some(typing) = self.typing.get_mut(&message.conversation_id) {
            typing.remove(&message.sender_id);
        }

        let timeline = self
            .timelines
            .entry(message.conversation_id.clone())
            .or_default();

        // Outside the filter window, the id still identifies a repeat.
        if timeline.iter().any(|m| m.id == message.id) {
            return false;
        }

        let at = timeline.partition_point(|m| (m.created_at, m.id) <= (message.created_at, message.id));
        timeline.insert(at, message);
        true
    }

    /// The other participant read everything the user sent them.
    fn mark_read_by(&mut self, conversation_id: &ConversationId, reader_id: Uuid) -> bool {
        if reader_id == self.user_id {
            return false;
        }

        let me = self.user_id;
        let Some(timeline) = self.timelines.get_mut(conversation_id) else {
            return false;
        };

        let mut changed = false;
        for message in timeline
            .iter_mut()
            .filter(|m| m.sender_id == me && m.receiver_id == reader_id && !m.is_read)
        {
            message.is_read = true;
            changed = true;
        }
        changed
    }
}
