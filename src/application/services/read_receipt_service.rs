//! Read Receipt Service
//!
//! Marks a reader's unread messages in a conversation as read and tells each
//! affected sender once.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::events::MessagesReadPayload;
use crate::domain::{ChatEvent, ConversationId, MessageRepository, RealtimeHub, Room};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// Result of a `mark_read` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceipt {
    /// Messages flipped to read
    pub marked: u64,
    /// Senders that were sent a `messages_read` event
    pub notified: Vec<Uuid>,
}

pub struct ReadReceiptService {
    messages: Arc<dyn MessageRepository>,
    hub: Arc<dyn RealtimeHub>,
}

impl ReadReceiptService {
    pub fn new(messages: Arc<dyn MessageRepository>, hub: Arc<dyn RealtimeHub>) -> Self {
        Self { messages, hub }
    }

    /// Mark everything unread for `reader_id` in `conversation_id` as read.
    ///
    /// Nothing unread means nothing is written and nothing is emitted, so a
    /// repeated call is a no-op.
    pub async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        reader_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<ReadReceipt, AppError> {
        if !conversation_id.contains(reader_id) {
            return Err(AppError::Forbidden(
                "Not a participant of this conversation".into(),
            ));
        }

        let unread = self
            .messages
            .find_unread_for(conversation_id, reader_id)
            .await?;

        if unread.is_empty() {
            return Ok(ReadReceipt::default());
        }

        let ids: Vec<Uuid> = unread.iter().map(|m| m.id).collect();
        let senders: BTreeSet<Uuid> = unread.iter().map(|m| m.sender_id).collect();

        let marked = self.messages.mark_read(&ids, now).await?;
        if marked == 0 {
            // An overlapping call already flipped these rows and notified.
            return Ok(ReadReceipt::default());
        }

        for sender_id in &senders {
            self.hub.emit_to(
                &Room::Personal(*sender_id),
                ChatEvent::MessagesRead(MessagesReadPayload {
                    conversation_id: conversation_id.clone(),
                    reader_id,
                }),
            );
        }
        metrics::record_read_receipts(senders.len());

        tracing::debug!(
            conversation_id = %conversation_id,
            reader_id = %reader_id,
            marked,
            senders = senders.len(),
            "Messages marked read"
        );

        Ok(ReadReceipt {
            marked,
            notified: senders.into_iter().collect(),
        })
    }
}
