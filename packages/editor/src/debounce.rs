//! # Trailing-edge Debounce
//!
//! A single pending item plus its deadline. Scheduling restarts the quiet
//! period; the item comes out of `poll` once a full quiet period has passed
//! without another request, or out of `cancel` when someone needs it now.
//!
//! Nothing here runs on its own: the owner's event loop calls `poll`.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    item: T,
    deadline: Instant,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending item and restart the quiet period. Returns the
    /// item that was pending before, if any.
    pub fn schedule(&mut self, item: T, now: Instant) -> Option<T> {
        let deadline = now + self.delay;
        self.pending
            .replace(Pending { item, deadline })
            .map(|displaced| displaced.item)
    }

    /// Restart the quiet period of the pending item
    pub fn restart(&mut self, now: Instant) {
        if let Some(pending) = &mut self.pending {
            pending.deadline = now + self.delay;
        }
    }

    pub fn pending_mut(&mut self) -> Option<&mut T> {
        self.pending.as_mut().map(|pending| &mut pending.item)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    /// Take the pending item if its quiet period is over
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|pending| now >= pending.deadline);

        if due {
            self.cancel()
        } else {
            None
        }
    }

    /// Take the pending item regardless of its deadline
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.item)
    }
}
