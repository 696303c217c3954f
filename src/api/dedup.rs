//! In-memory guard against Slack redelivering the same event.
//!
//! Slack retries an event up to three times when the ack takes longer than
//! three seconds, so the same `event_id` can arrive more than once.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};

/// Bounded set of recently seen event ids with FIFO eviction.
#[derive(Debug)]
pub struct EventDeduplicator {
    capacity: usize,
    inner: Mutex<Seen>,
}

#[derive(Debug, Default)]
struct Seen {
    ids: HashSet<String>,
    order: VecDeque<String>,
}

impl EventDeduplicator {
    /// A capacity of zero disables de-duplication.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Seen::default()),
        }
    }

    /// Records `event_id` and returns `true` if it had not been seen yet.
    pub fn first_seen(&self, event_id: &str) -> bool {
        if self.capacity == 0 {
            return true;
        }

        let mut seen = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if seen.ids.contains(event_id) {
            return false;
        }

        if seen.order.len() >= self.capacity {
            if let Some(oldest) = seen.order.pop_front() {
                seen.ids.remove(&oldest);
            }
        }
        seen.ids.insert(event_id.to_string());
        seen.order.push_back(event_id.to_string());
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
