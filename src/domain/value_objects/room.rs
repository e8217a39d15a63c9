//! Fan-out rooms.

use std::fmt;

use uuid::Uuid;

use super::ConversationId;

/// A pub/sub fan-out group.
///
/// Every connection sits in exactly one personal room (named after its user)
/// and at most one conversation room.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Room {
    /// Direct notifications for one user, independent of what they are viewing.
    Personal(Uuid),
    /// Viewers of one conversation.
    Conversation(ConversationId),
}

impl Room {
    pub fn is_personal(&self) -> bool {
        matches!(self, Room::Personal(_))
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::Personal(user_id) => write!(f, "{}", user_id),
            Room::Conversation(id) => write!(f, "{}", id),
        }
    }
}

impl From<ConversationId> for Room {
    fn from(id: ConversationId) -> Self {
        Room::Conversation(id)
    }
}
