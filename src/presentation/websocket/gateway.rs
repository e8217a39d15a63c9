//! WebSocket Gateway
//!
//! Owns the connection registry, per-session outbound queues and room
//! membership, and implements the `RealtimeHub` fan-out port.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::rooms::RoomRegistry;
use crate::domain::events::{JoinedConversationPayload, UserSummary};
use crate::domain::{ChatEvent, ConversationId, RealtimeHub, Room, User};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// The live connection of a user. At most one per user; a reconnect replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionRecord {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub connected_at: DateTime<Utc>,
}

/// Connected session with its outbound queue
struct SessionHandle {
    user_id: Uuid,
    display_name: String,
    sender: mpsc::UnboundedSender<ChatEvent>,
}

/// WebSocket gateway managing all connections
pub struct Gateway {
    /// User id -> current connection
    connections: DashMap<Uuid, ConnectionRecord>,
    /// Session id -> outbound queue
    sessions: DashMap<Uuid, SessionHandle>,
    rooms: RoomRegistry,
    /// Heartbeat interval advertised to clients, in milliseconds
    heartbeat_interval_ms: u64,
}

impl Gateway {
    pub fn new(heartbeat_interval_ms: u64) -> Self {
        Self {
            connections: DashMap::new(),
            sessions: DashMap::new(),
            rooms: RoomRegistry::new(),
            heartbeat_interval_ms,
        }
    }

    /// Get the heartbeat interval
    pub fn heartbeat_interval(&self) -> u64 {
        self.heartbeat_interval_ms
    }

    /// Register an authenticated session and place it in its personal room.
    ///
    /// Returns the connection record it replaced, if the user was already
    /// connected elsewhere.
    pub fn register(
        &self,
        session_id: Uuid,
        user: &User,
        sender: mpsc::UnboundedSender<ChatEvent>,
    ) -> Option<ConnectionRecord> {
        self.sessions.insert(
            session_id,
            SessionHandle {
                user_id: user.id,
                display_name: user.name.clone(),
                sender,
            },
        );

        let previous = self.connections.insert(
            user.id,
            ConnectionRecord {
                session_id,
                user_id: user.id,
                display_name: user.name.clone(),
                connected_at: Utc::now(),
            },
        );

        self.rooms.join(session_id, Room::Personal(user.id));
        metrics::set_websocket_connections(self.sessions.len());

        tracing::info!(
            user_id = %user.id,
            session_id = %session_id,
            replaced = previous.is_some(),
            "Session registered"
        );

        previous
    }

    /// Remove a session from every room.
    ///
    /// Returns the connection record if this session was the user's current
    /// one; a stale session closing after a reconnect returns `None` and
    /// leaves the newer record alone.
    pub fn unregister(&self, session_id: Uuid) -> Option<ConnectionRecord> {
        let (_, handle) = self.sessions.remove(&session_id)?;
        self.rooms.remove_session(session_id);
        metrics::set_websocket_connections(self.sessions.len());

        let removed = self
            .connections
            .remove_if(&handle.user_id, |_, record| record.session_id == session_id)
            .map(|(_, record)| record);

        tracing::info!(
            user_id = %handle.user_id,
            session_id = %session_id,
            current = removed.is_some(),
            "Session unregistered"
        );

        removed
    }

    /// Re-create the connection record for a live session whose record was
    /// evicted, stamped with the heartbeat time `at`. Returns whether a
    /// record was inserted.
    pub fn restore(&self, session_id: Uuid, at: DateTime<Utc>) -> bool {
        let Some((user_id, display_name)) = self
            .sessions
            .get(&session_id)
            .map(|h| (h.user_id, h.display_name.clone()))
        else {
            return false;
        };

        match self.connections.entry(user_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(ConnectionRecord {
                    session_id,
                    user_id,
                    display_name,
                    connected_at: at,
                });
                true
            }
        }
    }

    /// Move a session into `conversation_id`'s room.
    ///
    /// The session leaves every room but its own personal room, joins the
    /// conversation room, and the other members are told it joined.
    pub fn join_conversation(
        &self,
        session_id: Uuid,
        conversation_id: &ConversationId,
    ) -> Result<(), AppError> {
        let (user_id, display_name) = self
            .sessions
            .get(&session_id)
            .map(|h| (h.user_id, h.display_name.clone()))
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", session_id)))?;

        if !conversation_id.contains(user_id) {
            return Err(AppError::Forbidden(
                "Not a participant of this conversation".into(),
            ));
        }

        let personal = Room::Personal(user_id);
        if !self.rooms.is_member(session_id, &personal) {
            tracing::warn!(
                user_id = %user_id,
                session_id = %session_id,
                "Personal room membership lost, restoring"
            );
            self.rooms.join(session_id, personal.clone());
        }

        let left = self.rooms.leave_where(session_id, |room| room != &personal);
        let room = Room::Conversation(conversation_id.clone());
        self.rooms.join(session_id, room.clone());

        tracing::debug!(
            user_id = %user_id,
            session_id = %session_id,
            conversation_id = %conversation_id,
            left = left.len(),
            "Joined conversation room"
        );

        self.emit_to_except(
            &room,
            ChatEvent::UserJoinedConversation(JoinedConversationPayload {
                conversation_id: conversation_id.clone(),
                user: UserSummary {
                    id: user_id,
                    name: display_name,
                },
            }),
            session_id,
        );

        Ok(())
    }

    /// Push a direct event (notification, session lifecycle, ...) to a user's
    /// personal room.
    pub fn notify_user(&self, user_id: Uuid, event: ChatEvent) {
        self.emit_to(&Room::Personal(user_id), event);
    }

    /// Send event directly to a session (bypassing rooms)
    pub fn send_to_session(&self, session_id: Uuid, event: ChatEvent) -> bool {
        self.sessions
            .get(&session_id)
            .map(|handle| handle.sender.send(event).is_ok())
            .unwrap_or(false)
    }

    pub fn connection(&self, user_id: Uuid) -> Option<ConnectionRecord> {
        self.connections.get(&user_id).map(|r| r.clone())
    }

    pub fn is_connected(&self, user_id: Uuid) -> bool {
        self.connections.contains_key(&user_id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }
}

impl RealtimeHub for Gateway {
    fn emit_to(&self, room: &Room, event: ChatEvent) {
        for session_id in self.rooms.members_of(room) {
            self.send_to_session(session_id, event.clone());
        }
    }

    fn emit_to_except(&self, room: &Room, event: ChatEvent, except_session: Uuid) {
        for session_id in self.rooms.members_of(room) {
            if session_id != except_session {
                self.send_to_session(session_id, event.clone());
            }
        }
    }

    fn broadcast(&self, event: ChatEvent) {
        for handle in self.sessions.iter() {
            let _ = handle.sender.send(event.clone());
        }
    }

    fn evict(&self, user_id: Uuid, last_seen: DateTime<Utc>) -> bool {
        self.connections
            .remove_if(&user_id, |_, record| record.connected_at <= last_seen)
            .is_some()
    }
}
