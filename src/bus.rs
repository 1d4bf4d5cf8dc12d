use crate::events::Event;
use tokio::sync::broadcast;

/// Reporting channel handed to each component at construction.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: Event) -> Result<usize, broadcast::error::SendError<Event>> {
        self.tx.send(event)
    }

    /// Publishes without caring whether anyone listens.
    pub fn emit(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}
