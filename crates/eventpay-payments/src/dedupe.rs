//! Idempotent Event Handling
//!
//! The processor retries any delivery it considers failed. A replay of an
//! already-dispatched event must be acknowledged without running the sinks
//! again, or every retry risks a duplicate email and ledger row.

use std::collections::HashSet;
use std::sync::RwLock;

use crate::error::Result;

/// Store of processor event ids that have already been dispatched.
pub trait ProcessedEventStore: Send + Sync {
    /// Mark an event id as processed.
    ///
    /// Returns `true` if the id was new, `false` if it was seen before.
    fn mark(&self, event_id: &str) -> Result<bool>;

    /// Whether an event id has been processed.
    fn contains(&self, event_id: &str) -> Result<bool>;
}

/// In-memory store (process lifetime only).
#[derive(Default)]
pub struct MemoryProcessedEventStore {
    seen: RwLock<HashSet<String>>,
}

impl MemoryProcessedEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProcessedEventStore for MemoryProcessedEventStore {
    fn mark(&self, event_id: &str) -> Result<bool> {
        let mut seen = self.seen.write().unwrap();
        Ok(seen.insert(event_id.to_string()))
    }

    fn contains(&self, event_id: &str) -> Result<bool> {
        Ok(self.seen.read().unwrap().contains(event_id))
    }
}
