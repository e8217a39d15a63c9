//! Message entity and repository trait.
//!
//! Maps to the `messages` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::ConversationId;
use crate::shared::error::AppError;

/// A file attached to a message. Upload itself happens elsewhere; the chat
/// layer only carries the resulting reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub url: String,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: u64,
}

/// Represents a direct message between two users.
///
/// Maps to the `messages` table:
/// - id: UUID PRIMARY KEY (v7, time ordered)
/// - sender_id / receiver_id: UUID NOT NULL REFERENCES users(id)
/// - conversation_id: TEXT NOT NULL
/// - content: TEXT NOT NULL
/// - is_read: BOOLEAN NOT NULL DEFAULT FALSE
/// - read_at: TIMESTAMPTZ NULL
/// - attachments: JSONB NOT NULL DEFAULT '[]'
/// - client_message_id: TEXT NULL, UNIQUE (sender_id, client_message_id)
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,

    pub sender_id: Uuid,

    pub receiver_id: Uuid,

    /// Always `ConversationId::between(sender_id, receiver_id)`
    pub conversation_id: ConversationId,

    pub content: String,

    pub is_read: bool,

    pub read_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub attachments: Vec<Attachment>,

    /// Idempotency token chosen by the sending client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_message_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Build a new unread message between `sender_id` and `receiver_id`.
    pub fn new(
        sender_id: Uuid,
        receiver_id: Uuid,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            sender_id,
            receiver_id,
            conversation_id: ConversationId::between(sender_id, receiver_id),
            content: content.into(),
            is_read: false,
            read_at: None,
            attachments: Vec::new(),
            client_message_id: None,
            created_at,
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_client_message_id(mut self, client_message_id: Option<String>) -> Self {
        self.client_message_id = client_message_id;
        self
    }

    /// Key used to recognise the same delivery arriving more than once.
    pub fn delivery_key(&self) -> String {
        format!("{}:{}", self.id, self.conversation_id)
    }
}

/// Repository trait for Message data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a new message.
    ///
    /// Returns `AppError::Conflict` if `(sender_id, client_message_id)` is
    /// already taken.
    async fn create(&self, message: &Message) -> Result<Message, AppError>;

    /// Find a sender's message by its client idempotency token.
    async fn find_by_client_message_id(
        &self,
        sender_id: Uuid,
        client_message_id: &str,
    ) -> Result<Option<Message>, AppError>;

    /// Find the newest message with identical sender, conversation and
    /// content created at or after `since`.
    async fn find_recent_duplicate(
        &self,
        sender_id: Uuid,
        conversation_id: &ConversationId,
        content: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<Message>, AppError>;

    /// Unread messages in a conversation addressed to `receiver_id`.
    async fn find_unread_for(
        &self,
        conversation_id: &ConversationId,
        receiver_id: Uuid,
    ) -> Result<Vec<Message>, AppError>;

    /// Mark the given messages read in one batch. Returns how many changed.
    async fn mark_read(&self, ids: &[Uuid], read_at: DateTime<Utc>) -> Result<u64, AppError>;

    /// Latest `limit` messages in a conversation, oldest first.
    async fn find_by_conversation(
        &self,
        conversation_id: &ConversationId,
        limit: i64,
    ) -> Result<Vec<Message>, AppError>;
}
