//! WebSocket Session Management

use uuid::Uuid;

use crate::domain::ConversationId;

/// Per-connection state owned by the socket task
#[derive(Debug)]
pub struct SessionState {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    /// Conversation room joined via `join_conversation`
    pub conversation: Option<ConversationId>,
}

impl SessionState {
    pub fn new(session_id: Uuid, user_id: Uuid, display_name: String) -> Self {
        Self {
            session_id,
            user_id,
            display_name,
            conversation: None,
        }
    }

    pub fn is_viewing(&self, conversation_id: &ConversationId) -> bool {
        self.conversation.as_ref() == Some(conversation_id)
    }
}
