//! Message Service
//!
//! Idempotent message creation and conversation history.
//!
//! A submission is matched against earlier ones before anything is written:
//! first by the client's idempotency token, then by identical content in the
//! same conversation inside the send window. A match returns the stored
//! message and is not fanned out again.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::{
    Attachment, ChatEvent, ConversationId, Message, MessageRepository, RealtimeHub, Room,
    UserRepository,
};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

pub const MAX_CONTENT_LENGTH: usize = 2000;
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;
pub const MAX_HISTORY_LIMIT: i64 = 100;

/// Message service trait
#[async_trait]
pub trait MessageService: Send + Sync {
    /// Send a direct message, returning the stored message and whether it was
    /// newly created.
    async fn send_message(
        &self,
        sender_id: Uuid,
        request: CreateMessageDto,
        now: DateTime<Utc>,
    ) -> Result<SendOutcome, MessageError>;

    /// Latest messages of a conversation, oldest first. Participants only.
    async fn conversation_messages(
        &self,
        conversation_id: &ConversationId,
        requester_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, MessageError>;
}

/// Create message request
#[derive(Debug, Clone)]
pub struct CreateMessageDto {
    pub receiver_id: Uuid,
    pub content: String,
    pub client_message_id: Option<String>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SendOutcome {
    pub message: Message,
    /// False when an earlier submission was returned instead.
    pub created: bool,
}

/// Message service errors
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Receiver not found")]
    ReceiverNotFound,

    #[error("Cannot send a message to yourself")]
    SelfMessage,

    #[error("Message must have content or attachments")]
    Empty,

    #[error("Message too long")]
    ContentTooLong,

    #[error("Permission denied")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AppError> for MessageError {
    fn from(e: AppError) -> Self {
        MessageError::Internal(e.to_string())
    }
}

impl From<MessageError> for AppError {
    fn from(e: MessageError) -> Self {
        match e {
            MessageError::ReceiverNotFound => AppError::NotFound(e.to_string()),
            MessageError::SelfMessage | MessageError::Empty | MessageError::ContentTooLong => {
                AppError::BadRequest(e.to_string())
            }
            MessageError::Forbidden => AppError::Forbidden(e.to_string()),
            MessageError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// MessageService implementation
pub struct MessageServiceImpl {
    messages: Arc<dyn MessageRepository>,
    users: Arc<dyn UserRepository>,
    hub: Arc<dyn RealtimeHub>,
    send_window: Duration,
}

impl MessageServiceImpl {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        users: Arc<dyn UserRepository>,
        hub: Arc<dyn RealtimeHub>,
        send_window: Duration,
    ) -> Self {
        Self {
            messages,
            users,
            hub,
            send_window,
        }
    }

    /// Look for an earlier submission of the same message.
    async fn find_existing(
        &self,
        sender_id: Uuid,
        conversation_id: &ConversationId,
        content: &str,
        client_message_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<Message>, MessageError> {
        if let Some(token) = client_message_id {
            if let Some(existing) = self
                .messages
                .find_by_client_message_id(sender_id, token)
                .await?
            {
                metrics::record_deduplicated("client_message_id");
                return Ok(Some(existing));
            }
        }

        // Attachment-only messages have nothing to compare.
        if content.is_empty() {
            return Ok(None);
        }

        let existing = self
            .messages
            .find_recent_duplicate(sender_id, conversation_id, content, now - self.send_window)
            .await?;
        if existing.is_some() {
            metrics::record_deduplicated("content_window");
        }

        Ok(existing)
    }

    fn validate(sender_id: Uuid, request: &CreateMessageDto) -> Result<(), MessageError> {
        if request.receiver_id == sender_id {
            return Err(MessageError::SelfMessage);
        }
        if request.content.trim().is_empty() && request.attachments.is_empty() {
            return Err(MessageError::Empty);
        }
        if request.content.chars().count() > MAX_CONTENT_LENGTH {
            return Err(MessageError::ContentTooLong);
        }
        Ok(())
    }
}

#[async_trait]
impl MessageService for MessageServiceImpl {
    async fn send_message(
        &self,
        sender_id: Uuid,
        request: CreateMessageDto,
        now: DateTime<Utc>,
    ) -> Result<SendOutcome, MessageError> {
        Self::validate(sender_id, &request)?;

        self.users
            .find_by_id(request.receiver_id)
            .await?
            .ok_or(MessageError::ReceiverNotFound)?;

        let conversation_id = ConversationId::between(sender_id, request.receiver_id);
        let client_message_id = request
            .client_message_id
            .filter(|token| !token.trim().is_empty());

        if let Some(existing) = self
            .find_existing(
                sender_id,
                &conversation_id,
                &request.content,
                client_message_id.as_deref(),
                now,
            )
            .await?
        {
            tracing::debug!(
                sender_id = %sender_id,
                message_id = %existing.id,
                "Duplicate submission, returning stored message"
            );
            return Ok(SendOutcome {
                message: existing,
                created: false,
            });
        }

        let message = Message::new(sender_id, request.receiver_id, request.content, now)
            .with_attachments(request.attachments)
            .with_client_message_id(client_message_id);

        let created = match self.messages.create(&message).await {
            Ok(created) => created,
            Err(AppError::Conflict(_)) => {
                // Lost a race with a concurrent submission of the same token.
                let existing = self
                    .find_existing(
                        sender_id,
                        &conversation_id,
                        &message.content,
                        message.client_message_id.as_deref(),
                        now,
                    )
                    .await?
                    .ok_or_else(|| {
                        MessageError::Internal(
                            "Duplicate key reported but no stored message found".into(),
                        )
                    })?;
                return Ok(SendOutcome {
                    message: existing,
                    created: false,
                });
            }
            Err(e) => return Err(e.into()),
        };

        self.hub.emit_to(
            &Room::Conversation(conversation_id),
            ChatEvent::new_message(created.clone()),
        );
        self.hub.emit_to(
            &Room::Personal(created.receiver_id),
            ChatEvent::new_message(created.clone()),
        );

        tracing::info!(
            message_id = %created.id,
            sender_id = %sender_id,
            receiver_id = %created.receiver_id,
            "Message created"
        );

        Ok(SendOutcome {
            message: created,
            created: true,
        })
    }

    async fn conversation_messages(
        &self,
        conversation_id: &ConversationId,
        requester_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, MessageError> {
        if !conversation_id.contains(requester_id) {
            return Err(MessageError::Forbidden);
        }

        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);

        Ok(self
            .messages
            .find_by_conversation(conversation_id, limit)
            .await?)
    }
}
