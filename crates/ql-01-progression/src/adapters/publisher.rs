//! Event sinks: where committed progression events go.

use std::sync::Arc;

use shared_bus::{InMemoryEventBus, ProgressionEvent};
use tracing::debug;

use crate::ports::outbound::ProgressionEventSink;

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl ProgressionEventSink for NoOpEventSink {
    fn publish(&self, _event: ProgressionEvent) {}
}

/// Forwards events to the in-process bus.
#[derive(Clone)]
pub struct BusEventSink {
    bus: Arc<InMemoryEventBus>,
}

impl BusEventSink {
    pub fn new(bus: Arc<InMemoryEventBus>) -> Self {
        Self { bus }
    }
}

impl ProgressionEventSink for BusEventSink {
    fn publish(&self, event: ProgressionEvent) {
        let topic = event.topic();
        let receivers = self.bus.publish(event);
        debug!(?topic, receivers, "Forwarded progression event");
    }
}

/// Keeps every event in memory for assertions.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: parking_lot::Mutex<Vec<ProgressionEvent>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressionEvent> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<ProgressionEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl ProgressionEventSink for RecordingEventSink {
    fn publish(&self, event: ProgressionEvent) {
        self.events.lock().push(event);
    }
}
