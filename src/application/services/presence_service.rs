//! Presence Tracker
//!
//! Heartbeat bookkeeping and the liveness sweep.
//!
//! Each user is Online while a heartbeat record exists and Offline otherwise.
//! Records are created on connect and on every heartbeat, and removed by an
//! explicit disconnect or by the sweep once the last heartbeat is older than
//! the liveness threshold. Staleness is therefore bounded by
//! `sweep interval + liveness threshold`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use uuid::Uuid;

use crate::domain::{ChatEvent, RealtimeHub, UserRepository};
use crate::infrastructure::metrics;

/// Outcome of a heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatOutcome {
    /// The user was already tracked as online.
    Refreshed,
    /// The user had been swept offline and is online again.
    Reconciled,
}

pub struct PresenceTracker {
    /// User id -> most recent liveness signal
    heartbeats: DashMap<Uuid, DateTime<Utc>>,
    liveness_threshold: chrono::Duration,
    users: Arc<dyn UserRepository>,
    hub: Arc<dyn RealtimeHub>,
}

impl PresenceTracker {
    pub fn new(
        liveness_threshold: chrono::Duration,
        users: Arc<dyn UserRepository>,
        hub: Arc<dyn RealtimeHub>,
    ) -> Self {
        Self {
            heartbeats: DashMap::new(),
            liveness_threshold,
            users,
            hub,
        }
    }

    /// Offline -> Online on a successful connect.
    pub async fn user_connected(&self, user_id: Uuid, now: DateTime<Utc>) {
        self.heartbeats.insert(user_id, now);
        self.mark_online(user_id, now, "connect").await;
    }

    /// Record a liveness signal.
    ///
    /// A heartbeat from a user with no record (swept while the socket stayed
    /// open) brings them back online.
    pub async fn heartbeat(&self, user_id: Uuid, now: DateTime<Utc>) -> HeartbeatOutcome {
        let previous = self.heartbeats.insert(user_id, now);

        if previous.is_none() {
            self.mark_online(user_id, now, "heartbeat").await;
            return HeartbeatOutcome::Reconciled;
        }

        self.persist(user_id, true, now).await;
        HeartbeatOutcome::Refreshed
    }

    /// Online -> Offline on an explicit disconnect.
    pub async fn user_disconnected(&self, user_id: Uuid, now: DateTime<Utc>) {
        self.heartbeats.remove(&user_id);
        self.mark_offline(user_id, now, "disconnect").await;
    }

    /// Evict every user whose last heartbeat is older than the liveness
    /// threshold at `now`. Returns the evicted user ids.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Vec<Uuid> {
        let stale: Vec<Uuid> = self
            .heartbeats
            .iter()
            .filter(|entry| self.is_stale(*entry.value(), now))
            .map(|entry| *entry.key())
            .collect();

        let mut evicted = Vec::with_capacity(stale.len());
        for user_id in stale {
            // A heartbeat may have landed since the scan.
            let Some((_, last_seen)) = self
                .heartbeats
                .remove_if(&user_id, |_, seen| self.is_stale(*seen, now))
            else {
                continue;
            };

            // A connection registered after `last_seen` belongs to a reconnect.
            self.hub.evict(user_id, last_seen);
            tracing::info!(
                user_id = %user_id,
                last_seen = %last_seen,
                "No heartbeat within liveness threshold, marking offline"
            );
            self.mark_offline(user_id, last_seen, "sweep").await;
            evicted.push(user_id);
        }

        evicted
    }

    /// Run `sweep` every `period` until the returned task is aborted.
    pub fn spawn_sweeper(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await; // Skip first immediate tick

            loop {
                ticker.tick().await;
                let evicted = self.sweep(Utc::now()).await;
                if !evicted.is_empty() {
                    tracing::debug!(evicted = evicted.len(), "Presence sweep finished");
                }
            }
        })
    }

    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.heartbeats.contains_key(&user_id)
    }

    pub fn last_heartbeat(&self, user_id: Uuid) -> Option<DateTime<Utc>> {
        self.heartbeats.get(&user_id).map(|seen| *seen)
    }

    pub fn tracked_users(&self) -> usize {
        self.heartbeats.len()
    }

    fn is_stale(&self, last_seen: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - last_seen > self.liveness_threshold
    }

    async fn mark_online(&self, user_id: Uuid, now: DateTime<Utc>, reason: &str) {
        self.persist(user_id, true, now).await;
        metrics::record_presence_transition("online", reason);
        self.hub.broadcast(ChatEvent::online(user_id, now));
    }

    async fn mark_offline(&self, user_id: Uuid, last_seen: DateTime<Utc>, reason: &str) {
        self.persist(user_id, false, last_seen).await;
        metrics::record_presence_transition("offline", reason);
        self.hub.broadcast(ChatEvent::offline(user_id, last_seen));
    }

    /// Store failures only degrade presence accuracy; log and carry on.
    async fn persist(&self, user_id: Uuid, is_online: bool, last_seen: DateTime<Utc>) {
        if let Err(e) = self.users.set_presence(user_id, is_online, last_seen).await {
            tracing::warn!(
                user_id = %user_id,
                is_online,
                error = %e,
                "Failed to persist presence"
            );
        }
    }
}
