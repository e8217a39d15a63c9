//! User entity and repository trait.
//!
//! Maps to the `users` table. Only the fields the chat layer reads or writes
//! are modelled here; profile management lives in the marketplace API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Represents a marketplace user as seen by the chat layer.
///
/// Maps to the `users` table:
/// - id: UUID PRIMARY KEY
/// - name: TEXT NOT NULL
/// - email: TEXT NOT NULL UNIQUE
/// - avatar_url: TEXT NULL
/// - is_online: BOOLEAN NOT NULL DEFAULT FALSE
/// - last_seen: TIMESTAMPTZ NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    /// Display name shown in chat
    pub name: String,

    #[serde(skip_serializing, default)]
    pub email: String,

    pub avatar_url: Option<String>,

    /// Persisted presence flag
    pub is_online: bool,

    /// Last liveness signal seen for this user
    pub last_seen: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh, offline user.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            avatar_url: None,
            is_online: false,
            last_seen: None,
            created_at: Utc::now(),
        }
    }
}

/// Repository trait for the persisted user store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Persist the online flag and last-seen timestamp.
    async fn set_presence(
        &self,
        id: Uuid,
        is_online: bool,
        last_seen: DateTime<Utc>,
    ) -> Result<(), AppError>;
}
