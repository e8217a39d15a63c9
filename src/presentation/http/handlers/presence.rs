//! Presence Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::application::dto::PresenceResponse;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Current presence of a user
pub async fn get_presence(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<PresenceResponse>, AppError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    Ok(Json(PresenceResponse::from_user(
        &user,
        state.presence.last_heartbeat(user_id),
    )))
}
