//! Response DTOs
//!
//! Data structures for API response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::User;

/// Presence of a single user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceResponse {
    pub user_id: Uuid,
    pub is_online: bool,
    pub last_seen: Option<DateTime<Utc>>,
}

impl PresenceResponse {
    /// Live state wins over the stored flag, which lags behind by a write.
    pub fn from_user(user: &User, live: Option<DateTime<Utc>>) -> Self {
        Self {
            user_id: user.id,
            is_online: live.is_some(),
            last_seen: live.or(user.last_seen),
        }
    }
}
