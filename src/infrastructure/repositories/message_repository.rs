//! Message Repository Implementation
//!
//! PostgreSQL implementation of the message store: idempotent inserts backed
//! by a unique index, duplicate lookups and batched read marking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Attachment, ConversationId, Message, MessageRepository};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

const MESSAGE_COLUMNS: &str = r#"
    id, sender_id, receiver_id, conversation_id, content, is_read, read_at,
    attachments, client_message_id, created_at
"#;

/// PostgreSQL message repository implementation.
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Creates a new PgMessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for message queries.
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    sender_id: Uuid,
    receiver_id: Uuid,
    conversation_id: String,
    content: String,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    attachments: Json<Vec<Attachment>>,
    client_message_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    /// Converts database row to domain Message entity.
    ///
    /// The stored conversation id is recomputed from the participants rather
    /// than trusted.
    fn into_message(self) -> Message {
        let conversation_id = ConversationId::between(self.sender_id, self.receiver_id);
        if conversation_id.as_str() != self.conversation_id {
            tracing::warn!(
                message_id = %self.id,
                stored = %self.conversation_id,
                "Stored conversation id does not match participants"
            );
        }

        Message {
            id: self.id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            conversation_id,
            content: self.content,
            is_read: self.is_read,
            read_at: self.read_at,
            attachments: self.attachments.0,
            client_message_id: self.client_message_id,
            created_at: self.created_at,
        }
    }
}

fn map_insert_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("Message already exists for this client message id".into())
        }
        _ => AppError::Database(err),
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: &Message) -> Result<Message, AppError> {
        let started = std::time::Instant::now();
        let sql = format!(
            r#"
            INSERT INTO messages (
                id, sender_id, receiver_id, conversation_id, content, is_read,
                read_at, attachments, client_message_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        );

        let row = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(message.id)
            .bind(message.sender_id)
            .bind(message.receiver_id)
            .bind(message.conversation_id.as_str())
            .bind(&message.content)
            .bind(message.is_read)
            .bind(message.read_at)
            .bind(Json(message.attachments.clone()))
            .bind(message.client_message_id.as_deref())
            .bind(message.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_insert_error)?;

        metrics::record_db_query("insert", "messages", started.elapsed().as_secs_f64());
        Ok(row.into_message())
    }

    async fn find_by_client_message_id(
        &self,
        sender_id: Uuid,
        client_message_id: &str,
    ) -> Result<Option<Message>, AppError> {
        let sql = format!(
            "SELECT {} FROM messages WHERE sender_id = $1 AND client_message_id = $2",
            MESSAGE_COLUMNS
        );

        let row = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(sender_id)
            .bind(client_message_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(MessageRow::into_message))
    }

    async fn find_recent_duplicate(
        &self,
        sender_id: Uuid,
        conversation_id: &ConversationId,
        content: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<Message>, AppError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM messages
            WHERE sender_id = $1
              AND conversation_id = $2
              AND content = $3
              AND created_at >= $4
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            MESSAGE_COLUMNS
        );

        let row = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(sender_id)
            .bind(conversation_id.as_str())
            .bind(content)
            .bind(since)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(MessageRow::into_message))
    }

    async fn find_unread_for(
        &self,
        conversation_id: &ConversationId,
        receiver_id: Uuid,
    ) -> Result<Vec<Message>, AppError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM messages
            WHERE conversation_id = $1 AND receiver_id = $2 AND is_read = FALSE
            ORDER BY created_at ASC
            "#,
            MESSAGE_COLUMNS
        );

        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(conversation_id.as_str())
            .bind(receiver_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(MessageRow::into_message).collect())
    }

    async fn mark_read(&self, ids: &[Uuid], read_at: DateTime<Utc>) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let started = std::time::Instant::now();
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = TRUE, read_at = $2
            WHERE id = ANY($1) AND is_read = FALSE
            "#,
        )
        .bind(ids)
        .bind(read_at)
        .execute(&self.pool)
        .await?;

        metrics::record_db_query("update", "messages", started.elapsed().as_secs_f64());
        Ok(result.rows_affected())
    }

    async fn find_by_conversation(
        &self,
        conversation_id: &ConversationId,
        limit: i64,
    ) -> Result<Vec<Message>, AppError> {
        let limit = limit.clamp(1, 200);
        let sql = format!(
            r#"
            SELECT * FROM (
                SELECT {}
                FROM messages
                WHERE conversation_id = $1
                ORDER BY created_at DESC
                LIMIT $2
            ) recent
            ORDER BY created_at ASC
            "#,
            MESSAGE_COLUMNS
        );

        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(conversation_id.as_str())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(MessageRow::into_message).collect())
    }
}
