use crate::MetaEvent;

/// Trait for consuming events.
///
/// The CLI forwards them to the log; tests collect them.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: MetaEvent);
}

/// Drops every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: MetaEvent) {}
}

/// Stores all events for later inspection.
#[derive(Default)]
pub struct CollectorSink {
    events: std::sync::Mutex<Vec<MetaEvent>>,
}

impl CollectorSink {
    pub fn events(&self) -> Vec<MetaEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for CollectorSink {
    fn emit(&self, event: MetaEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
