//! Message Handlers

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::application::dto::SendMessageRequest;
use crate::domain::Message;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validation_error;
use crate::startup::AppState;

/// Send a direct message.
///
/// 201 with the new message, or 200 with the stored one when the submission
/// is a duplicate.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    body.validate().map_err(validation_error)?;

    let outcome = state
        .message_service
        .send_message(auth.user_id, body.into(), Utc::now())
        .await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(outcome.message)))
}
