//! WebSocket Connection Handler
//!
//! Authenticates the upgrade, then runs one session: a writer task draining
//! the outbound queue and a reader loop dispatching client frames.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::messages::{ClientEvent, JoinConversationPayload, MessageReadPayload, TypingPayload};
use super::session::SessionState;
use crate::application::services::{AuthError, HeartbeatOutcome};
use crate::domain::events::{ReadyPayload, TypingPayload as UserTypingPayload};
use crate::domain::{ChatEvent, RealtimeHub, Room, User};
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Query string accepted on the upgrade request
#[derive(Debug, Default, Deserialize)]
pub struct GatewayQuery {
    pub token: Option<String>,
}

/// WebSocket upgrade handler.
///
/// The bearer token comes from the `Authorization` header or, for browsers,
/// the `token` query parameter. Authentication failures are answered with
/// 401 and the socket is never opened.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<GatewayQuery>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    let token = bearer
        .map(|TypedHeader(auth)| auth.token().to_string())
        .or(query.token)
        .ok_or(AuthError::MissingToken)?;

    let user = state.auth.authenticate(&token).await.map_err(|e| {
        tracing::debug!(error = %e, "Gateway authentication failed");
        AppError::from(e)
    })?;

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let max_message_size = state.settings.websocket.max_message_size;
    Ok(ws
        .max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state, user)))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState, user: User) {
    let session_id = Uuid::new_v4();

    // Split socket for concurrent read/write
    let (mut sender, mut receiver) = socket.split();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ChatEvent>();

    // Spawn task to forward messages from channel to WebSocket
    let mut sender_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!(event = event.name(), error = %e, "Failed to serialize event");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let mut session = open_session(&state, &user, session_id, tx.clone()).await;

    // Main message loop
    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        process_frame(text.as_str(), &mut session, &state).await;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        let _ = tx.send(ChatEvent::error("Binary frames are not supported"));
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(session_id = %session_id, "Connection closed");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::debug!(session_id = %session_id, error = %e, "WebSocket error");
                        break;
                    }
                    // Pong is handled automatically by axum
                    Some(Ok(_)) => {}
                }
            }

            // Writer gone means the peer is gone
            _ = &mut sender_task => break,
        }
    }

    // Cleanup
    sender_task.abort();
    close_session(&state, session_id).await;
}

/// Register a new authenticated session: personal room, presence, `ready`.
pub async fn open_session(
    state: &AppState,
    user: &User,
    session_id: Uuid,
    tx: mpsc::UnboundedSender<ChatEvent>,
) -> SessionState {
    state.gateway.register(session_id, user, tx.clone());
    state.presence.user_connected(user.id, Utc::now()).await;

    let _ = tx.send(ChatEvent::Ready(ReadyPayload {
        session_id,
        user_id: user.id,
        heartbeat_interval_ms: state.gateway.heartbeat_interval(),
    }));

    tracing::info!(
        user_id = %user.id,
        session_id = %session_id,
        "User connected"
    );

    SessionState::new(session_id, user.id, user.name.clone())
}

/// Tear down a session. Only the user's current session takes them offline.
pub async fn close_session(state: &AppState, session_id: Uuid) {
    match state.gateway.unregister(session_id) {
        Some(record) => {
            state
                .presence
                .user_disconnected(record.user_id, Utc::now())
                .await;
            tracing::info!(
                user_id = %record.user_id,
                session_id = %session_id,
                "User disconnected"
            );
        }
        None => {
            tracing::debug!(session_id = %session_id, "Superseded session closed");
        }
    }
}

/// Handle one text frame, answering failures with an `error` event.
pub async fn process_frame(text: &str, session: &mut SessionState, state: &AppState) {
    if let Err(e) = handle_message(text, session, state).await {
        tracing::debug!(
            session_id = %session.session_id,
            error = %e,
            "Rejected client frame"
        );
        state
            .gateway
            .send_to_session(session.session_id, ChatEvent::error(e.to_string()));
    }
}

/// Dispatch one text frame.
pub async fn handle_message(
    text: &str,
    session: &mut SessionState,
    state: &AppState,
) -> Result<(), AppError> {
    let event = ClientEvent::parse(text)
        .map_err(|e| AppError::BadRequest(format!("Malformed frame: {}", e)))?;

    match event {
        ClientEvent::Heartbeat => {
            let now = Utc::now();
            let outcome = state.presence.heartbeat(session.user_id, now).await;
            if outcome == HeartbeatOutcome::Reconciled
                && state.gateway.restore(session.session_id, now)
            {
                tracing::info!(
                    user_id = %session.user_id,
                    session_id = %session.session_id,
                    "Connection record restored by heartbeat"
                );
            }
            state
                .gateway
                .send_to_session(session.session_id, ChatEvent::HeartbeatAck);
        }

        ClientEvent::JoinConversation(JoinConversationPayload {
            conversation_id,
            other_user_id,
        }) => {
            if conversation_id.counterpart(session.user_id) != Some(other_user_id) {
                return Err(AppError::BadRequest(
                    "otherUserId is not the other participant of this conversation".into(),
                ));
            }

            // Re-joining the room already viewed is a no-op for the others.
            let room = Room::Conversation(conversation_id.clone());
            if session.is_viewing(&conversation_id)
                && state.gateway.rooms().is_member(session.session_id, &room)
            {
                return Ok(());
            }

            state
                .gateway
                .join_conversation(session.session_id, &conversation_id)?;
            session.conversation = Some(conversation_id);
        }

        ClientEvent::Typing(TypingPayload {
            conversation_id,
            is_typing,
        }) => {
            if !conversation_id.contains(session.user_id) {
                return Err(AppError::Forbidden(
                    "Not a participant of this conversation".into(),
                ));
            }
            state.gateway.emit_to_except(
                &Room::Conversation(conversation_id.clone()),
                ChatEvent::UserTyping(UserTypingPayload {
                    conversation_id,
                    user_id: session.user_id,
                    user_name: session.display_name.clone(),
                    is_typing,
                }),
                session.session_id,
            );
        }

        ClientEvent::MessageRead(MessageReadPayload {
            conversation_id,
            reader_id,
        }) => {
            if reader_id != session.user_id {
                return Err(AppError::Forbidden(
                    "readerId does not match the authenticated user".into(),
                ));
            }

            match state
                .read_receipts
                .mark_read(&conversation_id, reader_id, Utc::now())
                .await
            {
                Ok(_) => {}
                Err(e @ AppError::Forbidden(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        conversation_id = %conversation_id,
                        reader_id = %reader_id,
                        error = %e,
                        "Failed to mark messages read"
                    );
                }
            }
        }
    }

    Ok(())
}
