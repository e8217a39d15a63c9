//! Delivery deduplication.
//!
//! A message can reach a client through both the conversation room and the
//! personal room. The filter remembers delivery keys for a trailing window
//! and reports repeats so they can be dropped without rendering.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::domain::Message;

#[derive(Debug)]
pub struct DeliveryFilter {
    window: Duration,
    /// Key -> when it was first seen
    seen: HashMap<String, Instant>,
    /// Keys in arrival order, oldest first
    queue: VecDeque<(Instant, String)>,
}

impl DeliveryFilter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: HashMap::new(),
            queue: VecDeque::new(),
        }
    }

    /// Record `key` and return true if it had not been seen within the
    /// window.
    pub fn check_and_record(&mut self, key: &str, now: Instant) -> bool {
        self.prune(now);

        if self.seen.contains_key(key) {
            return false;
        }

        self.seen.insert(key.to_string(), now);
        self.queue.push_back((now, key.to_string()));
        true
    }

    /// `check_and_record` keyed by the message's delivery key.
    pub fn accept(&mut self, message: &Message, now: Instant) -> bool {
        self.check_and_record(&message.delivery_key(), now)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn prune(&mut self, now: Instant) {
        while let Some((seen_at, _)) = self.queue.front() {
            if now.duration_since(*seen_at) < self.window {
                break;
            }
            if let Some((_, key)) = self.queue.pop_front() {
                self.seen.remove(&key);
            }
        }
    }
}
