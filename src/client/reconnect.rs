//! Client-side reconnection.
//!
//! The server never retries a failed connection; the client backs off
//! exponentially up to a cap and starts over after a successful connect.

use std::time::Duration;

/// Connection state surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting { attempt: u32 },
}

#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    initial_delay: Duration,
    max_delay: Duration,
    /// Give up after this many consecutive failures; `None` retries forever.
    max_attempts: Option<u32>,
    attempt: u32,
    status: ConnectionStatus,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30), Some(10))
    }
}

impl ReconnectPolicy {
    pub fn new(initial_delay: Duration, max_delay: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            initial_delay,
            max_delay,
            max_attempts,
            attempt: 0,
            status: ConnectionStatus::Disconnected,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// The socket is up: reset the backoff.
    pub fn on_connected(&mut self) {
        self.attempt = 0;
        self.status = ConnectionStatus::Connected;
    }

    /// The socket dropped or a connect attempt failed.
    ///
    /// Returns how long to wait before the next attempt, or `None` once the
    /// attempt budget is spent.
    pub fn on_disconnected(&mut self) -> Option<Duration> {
        if self.max_attempts.is_some_and(|max| self.attempt >= max) {
            self.status = ConnectionStatus::Disconnected;
            return None;
        }

        let delay = self.delay_for(self.attempt);
        self.attempt += 1;
        self.status = ConnectionStatus::Reconnecting {
            attempt: self.attempt,
        };
        Some(delay)
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}
