//! Conversation Handlers
//!
//! History and read receipts for one direct conversation.

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::Utc;

use crate::application::dto::HistoryQuery;
use crate::application::services::ReadReceipt;
use crate::domain::{ConversationId, Message};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Latest messages, oldest first
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(conversation_id): Path<ConversationId>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Message>>, AppError> {
    let messages = state
        .message_service
        .conversation_messages(&conversation_id, auth.user_id, query.limit)
        .await?;

    Ok(Json(messages))
}

/// Mark everything addressed to the caller as read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(conversation_id): Path<ConversationId>,
) -> Result<Json<ReadReceipt>, AppError> {
    let receipt = state
        .read_receipts
        .mark_read(&conversation_id, auth.user_id, Utc::now())
        .await?;

    Ok(Json(receipt))
}
