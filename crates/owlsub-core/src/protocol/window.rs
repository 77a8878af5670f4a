//! Bounded recent-message history.

use std::collections::VecDeque;

/// Number of message ids remembered by default.
pub const DEFAULT_WINDOW_CAPACITY: usize = 50;

/// Last N message ids in arrival order. Never holds more than `capacity` ids.
#[derive(Debug, Clone)]
pub struct RecentMessageWindow {
    ids: VecDeque<String>,
    capacity: usize,
}

impl Default for RecentMessageWindow {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_WINDOW_CAPACITY)
    }
}

impl RecentMessageWindow {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ids: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|seen| seen == id)
    }

    /// Record `id` unless already present. Returns `false` for a repeat.
    ///
    /// Evicts the oldest id once the window is full.
    pub fn check_and_insert(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        if self.ids.len() == self.capacity {
            self.ids.pop_front();
        }
        self.ids.push_back(id.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
