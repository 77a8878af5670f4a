//! Reconnect delay: starts at a floor, doubles per failed attempt, capped.

use std::time::Duration;

/// Delay used after a successful reconnect resets the backoff.
pub const DEFAULT_FLOOR: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct Backoff {
    floor: Duration,
    ceiling: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(floor: Duration, ceiling: Duration) -> Self {
        Self {
            floor,
            ceiling: ceiling.max(floor),
            current: floor,
        }
    }

    /// Delay to wait before the next attempt.
    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn floor(&self) -> Duration {
        self.floor
    }

    pub fn on_failure(&mut self) {
        self.current = self.current.saturating_mul(2).min(self.ceiling);
    }

    pub fn reset(&mut self) {
        self.current = self.floor;
    }
}
