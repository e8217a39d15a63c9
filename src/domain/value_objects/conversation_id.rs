//! Conversation identifier.
//!
//! A direct conversation is named by its two participants: their ids are
//! sorted and joined with `_`, so either side can compute it without a lookup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

const SEPARATOR: char = '_';

/// Deterministic id of the conversation between two users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(String);

/// Error returned when parsing a malformed conversation id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversationIdError {
    #[error("conversation id must be two user ids joined by '_'")]
    Malformed,

    #[error("conversation id participants must be distinct")]
    SameParticipant,

    #[error("conversation id participants are not in canonical order")]
    NotCanonical,
}

impl ConversationId {
    /// Compute the conversation id for a pair of users, in either order.
    pub fn between(a: Uuid, b: Uuid) -> Self {
        let (a, b) = (a.to_string(), b.to_string());
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{}{}{}", first, SEPARATOR, second))
    }

    /// The two participants, in canonical order.
    pub fn participants(&self) -> (Uuid, Uuid) {
        // Constructors only admit two valid UUIDs.
        let (a, b) = self
            .0
            .split_once(SEPARATOR)
            .unwrap_or((self.0.as_str(), self.0.as_str()));
        (
            Uuid::parse_str(a).unwrap_or_default(),
            Uuid::parse_str(b).unwrap_or_default(),
        )
    }

    pub fn contains(&self, user_id: Uuid) -> bool {
        let (a, b) = self.participants();
        a == user_id || b == user_id
    }

    /// The participant that is not `user_id`, if `user_id` takes part.
    pub fn counterpart(&self, user_id: Uuid) -> Option<Uuid> {
        let (a, b) = self.participants();
        if a == user_id {
            Some(b)
        } else if b == user_id {
            Some(a)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ConversationId {
    type Err = ConversationIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s.split_once(SEPARATOR).ok_or(ConversationIdError::Malformed)?;
        let a = Uuid::parse_str(a).map_err(|_| ConversationIdError::Malformed)?;
        let b = Uuid::parse_str(b).map_err(|_| ConversationIdError::Malformed)?;

        if a == b {
            return Err(ConversationIdError::SameParticipant);
        }

        let canonical = Self::between(a, b);
        if canonical.0 != s {
            return Err(ConversationIdError::NotCanonical);
        }

        Ok(canonical)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ConversationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ConversationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
