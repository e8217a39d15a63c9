//! In-memory repositories.
//!
//! Used when no database URL is configured and by the test suites. They
//! honour the same contracts as the PostgreSQL implementations, including the
//! `(sender_id, client_message_id)` uniqueness backstop.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::{ConversationId, Message, MessageRepository, User, UserRepository};
use crate::shared::error::AppError;

/// In-memory user store.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: DashMap<Uuid, User>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user.
    pub fn insert(&self, user: User) {
        self.users.insert(user.id, user);
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn set_presence(
        &self,
        id: Uuid,
        is_online: bool,
        last_seen: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        user.is_online = is_online;
        user.last_seen = Some(last_seen);
        Ok(())
    }
}

/// In-memory message store.
#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: RwLock<Vec<Message>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored messages.
    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    /// Snapshot of a stored message.
    pub fn get(&self, id: Uuid) -> Option<Message> {
        self.messages.read().iter().find(|m| m.id == id).cloned()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(&self, message: &Message) -> Result<Message, AppError> {
        let mut messages = self.messages.write();

        if let Some(client_id) = message.client_message_id.as_deref() {
            let taken = messages.iter().any(|m| {
                m.sender_id == message.sender_id
                    && m.client_message_id.as_deref() == Some(client_id)
            });
            if taken {
                return Err(AppError::Conflict(
                    "Message already exists for this client message id".into(),
                ));
            }
        }

        if messages.iter().any(|m| m.id == message.id) {
            return Err(AppError::Conflict(format!("Message {} already exists", message.id)));
        }

        messages.push(message.clone());
        Ok(message.clone())
    }

    async fn find_by_client_message_id(
        &self,
        sender_id: Uuid,
        client_message_id: &str,
    ) -> Result<Option<Message>, AppError> {
        Ok(self
            .messages
            .read()
            .iter()
            .find(|m| {
                m.sender_id == sender_id
                    && m.client_message_id.as_deref() == Some(client_message_id)
            })
            .cloned())
    }

    async fn find_recent_duplicate(
        &self,
        sender_id: Uuid,
        conversation_id: &ConversationId,
        content: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<Message>, AppError> {
        Ok(self
            .messages
            .read()
            .iter()
            .filter(|m| {
                m.sender_id == sender_id
                    && &m.conversation_id == conversation_id
                    && m.content == content
                    && m.created_at >= since
            })
            .max_by_key(|m| m.created_at)
            .cloned())
    }

    async fn find_unread_for(
        &self,
        conversation_id: &ConversationId,
        receiver_id: Uuid,
    ) -> Result<Vec<Message>, AppError> {
        let mut unread: Vec<Message> = self
            .messages
            .read()
            .iter()
            .filter(|m| {
                &m.conversation_id == conversation_id && m.receiver_id == receiver_id && !m.is_read
            })
            .cloned()
            .collect();
        unread.sort_by_key(|m| m.created_at);
        Ok(unread)
    }

    async fn mark_read(&self, ids: &[Uuid], read_at: DateTime<Utc>) -> Result<u64, AppError> {
        let mut changed = 0;
        for message in self.messages.write().iter_mut() {
            if !message.is_read && ids.contains(&message.id) {
                message.is_read = true;
                message.read_at = Some(read_at);
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn find_by_conversation(
        &self,
        conversation_id: &ConversationId,
        limit: i64,
    ) -> Result<Vec<Message>, AppError> {
        let limit = limit.clamp(1, 200) as usize;
        let mut history: Vec<Message> = self
            .messages
            .read()
            .iter()
            .filter(|m| &m.conversation_id == conversation_id)
            .cloned()
            .collect();
        history.sort_by_key(|m| m.created_at);
        let skip = history.len().saturating_sub(limit);
        Ok(history.split_off(skip))
    }
}
