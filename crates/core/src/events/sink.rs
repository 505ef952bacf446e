//! Domain event sink trait and implementations.

use std::sync::{Arc, Mutex, MutexGuard};

use super::DomainEvent;

/// Receives ledger, valuation and sync events once the change behind them is
/// committed. Delivery is fire-and-forget: `emit` must not block and cannot
/// fail the operation that produced the event.
pub trait DomainEventSink: Send + Sync {
    fn emit(&self, event: DomainEvent);
}

/// Discards every event.
#[derive(Clone, Default)]
pub struct NoOpDomainEventSink;

impl DomainEventSink for NoOpDomainEventSink {
    fn emit(&self, _event: DomainEvent) {}
}

/// Sink that keeps every event in memory, for asserting on what a service
/// emitted.
#[derive(Clone, Default)]
pub struct MockDomainEventSink {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl MockDomainEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<DomainEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Events in emission order.
    pub fn events(&self) -> Vec<DomainEvent> {
        self.recorded().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded().is_empty()
    }
}

impl DomainEventSink for MockDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        self.recorded().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_sink_does_not_panic() {
        let sink = NoOpDomainEventSink;
        sink.emit(DomainEvent::ledger_initialized("w1"));
        sink.emit(DomainEvent::valuations_changed(vec!["w2".to_string()]));
    }

    #[test]
    fn test_mock_sink_keeps_emission_order() {
        let sink = MockDomainEventSink::new();
        assert!(sink.is_empty());

        sink.emit(DomainEvent::ledger_initialized("w1"));
        sink.emit(DomainEvent::movement_deleted("w1", "m1"));
        sink.emit(DomainEvent::ledger_rebuilt("w1"));

        assert_eq!(
            sink.events(),
            vec![
                DomainEvent::ledger_initialized("w1"),
                DomainEvent::movement_deleted("w1", "m1"),
                DomainEvent::ledger_rebuilt("w1"),
            ]
        );
    }
}
