//! Room membership
//!
//! Two-way index between sessions and the rooms they occupy.

use std::collections::HashSet;

use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::Room;

#[derive(Default)]
pub struct RoomRegistry {
    /// Room -> member session ids
    members: DashMap<Room, HashSet<Uuid>>,
    /// Session id -> rooms it occupies
    memberships: DashMap<Uuid, HashSet<Room>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, session_id: Uuid, room: Room) {
        self.members
            .entry(room.clone())
            .or_default()
            .insert(session_id);
        self.memberships.entry(session_id).or_default().insert(room);
    }

    pub fn leave(&self, session_id: Uuid, room: &Room) {
        if let Some(mut sessions) = self.members.get_mut(room) {
            sessions.remove(&session_id);
        }
        self.members.remove_if(room, |_, sessions| sessions.is_empty());

        if let Some(mut rooms) = self.memberships.get_mut(&session_id) {
            rooms.remove(room);
        }
    }

    /// Leave every room matching `predicate`. Returns the rooms left.
    pub fn leave_where<F>(&self, session_id: Uuid, predicate: F) -> Vec<Room>
    where
        F: Fn(&Room) -> bool,
    {
        let leaving: Vec<Room> = self
            .rooms_of(session_id)
            .into_iter()
            .filter(|room| predicate(room))
            .collect();

        for room in &leaving {
            self.leave(session_id, room);
        }

        leaving
    }

    /// Drop the session from every room.
    pub fn remove_session(&self, session_id: Uuid) {
        self.leave_where(session_id, |_| true);
        self.memberships.remove(&session_id);
    }

    pub fn is_member(&self, session_id: Uuid, room: &Room) -> bool {
        self.members
            .get(room)
            .map(|sessions| sessions.contains(&session_id))
            .unwrap_or(false)
    }

    pub fn members_of(&self, room: &Room) -> Vec<Uuid> {
        self.members
            .get(room)
            .map(|sessions| sessions.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn rooms_of(&self, session_id: Uuid) -> Vec<Room> {
        self.memberships
            .get(&session_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }
}
