//! Event storage.
//!
//! The recorder is storage-agnostic: anything implementing `EventStore` can
//! hold the chain.  `InMemoryEventStore` is the reference implementation;
//! `JsonlEventStore` (see `jsonl`) persists to an append-only file.

use folio_contracts::{error::FolioResult, event::Event};

/// Append-only storage for one chain.
///
/// Implementations are driven by `AuditRecorder`, which serializes every call
/// behind its own lock, so they need no internal synchronization.
pub trait EventStore: Send {
    /// Durably append one event.
    ///
    /// Must either store the event completely or return an error.  On error
    /// the recorder does not advance the chain head.
    fn append(&mut self, event: &Event) -> FolioResult<()>;

    /// Every stored event, in append order.
    fn events(&self) -> &[Event];
}

/// A `Vec`-backed event store.  Nothing is persisted.
#[derive(Debug, Default, Clone)]
pub struct InMemoryEventStore {
    events: Vec<Event>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap events that were produced elsewhere, e.g. a previously exported log.
    pub fn from_events(events: Vec<Event>) -> Self {
        Self { events }
    }
}

impl EventStore for InMemoryEventStore {
    fn append(&mut self, event: &Event) -> FolioResult<()> {
        self.events.push(event.clone());
        Ok(())
    }

    fn events(&self) -> &[Event] {
        &self.events
    }
}
