//! # Event Publisher
//!
//! The in-process bus the progression engine publishes committed events to.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;
use tracing::debug;

use crate::events::{EventFilter, ProgressionEvent};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;

/// Broadcast bus for progression events.
///
/// Publishing is synchronous and never waits on subscribers, so it can be
/// called right after a store commit from non-async code. A subscriber that
/// falls more than the channel capacity behind loses the oldest events.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<ProgressionEvent>,
    published: AtomicU64,
    undelivered: AtomicU64,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// `capacity` is the per-subscriber backlog; it must be non-zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            published: AtomicU64::new(0),
            undelivered: AtomicU64::new(0),
        }
    }

    /// Subscribe to the events accepted by `filter`, starting from now.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, users = ?filter.users, "Subscribed to progression events");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Publish one event. Returns how many subscriptions it was queued for.
    pub fn publish(&self, event: ProgressionEvent) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        let topic = event.topic();

        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                self.undelivered.fetch_add(1, Ordering::Relaxed);
                debug!(?topic, "No subscribers for progression event");
                0
            }
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Events published since the bus was created.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Events published while nobody was subscribed.
    #[must_use]
    pub fn undelivered(&self) -> u64 {
        self.undelivered.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}
