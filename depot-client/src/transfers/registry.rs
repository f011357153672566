//! Registry of live transfers
//!
//! The registry owns every transfer record from enqueue until the caller
//! acknowledges its terminal state, along with the cancel flag shared with
//! the record's executor task. All mutation funnels through `apply` and
//! `cancel`, which enforce the state machine: terminal states are
//! absorbing, byte counters never move backward, and events for unknown or
//! finished ids are discarded. That gate is what guarantees a canceled
//! transfer can never be flipped to Completed or Failed by a late event
//! from its still-unwinding executor.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;
use uuid::Uuid;

use super::executor::TransferEvent;
use super::types::Transfer;

struct RegistryEntry {
    record: Transfer,
    cancel_flag: Arc<AtomicBool>,
}

/// Thread-safe table of transfer records keyed by id
pub struct TransferRegistry {
    entries: Mutex<HashMap<Uuid, RegistryEntry>>,
}

impl TransferRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Insert a fresh record and hand back the cancel flag its executor
    /// task will watch
    pub fn register(&self, record: Transfer) -> Arc<AtomicBool> {
        let cancel_flag = Arc::new(AtomicBool::new(false));
        let id = record.id;
        self.entries
            .lock()
            .expect("transfer registry lock poisoned")
            .insert(
                id,
                RegistryEntry {
                    record,
                    cancel_flag: Arc::clone(&cancel_flag),
                },
            );
        cancel_flag
    }

    /// Fold one executor event into its record.
    ///
    /// Returns false when the event was discarded: unknown id, or the
    /// record already reached a terminal state.
    pub fn apply(&self, event: &TransferEvent) -> bool {
        let mut entries = self
            .entries
            .lock()
            .expect("transfer registry lock poisoned");
        let Some(entry) = entries.get_mut(&event.id()) else {
            return false;
        };
        let record = &mut entry.record;
        if record.status.is_terminal() {
            debug!(id = %record.id, "discarding event for finished transfer");
            return false;
        }

        match event {
            TransferEvent::Started { total_bytes, .. } => record.start(*total_bytes),
            TransferEvent::Progress {
                transferred_bytes,
                total_bytes,
                ..
            } => record.advance(*transferred_bytes, *total_bytes),
            TransferEvent::Completed { local_path, .. } => record.complete(local_path.clone()),
            TransferEvent::Failed { error, .. } => record.fail(error.clone()),
            TransferEvent::Canceled { .. } => record.cancel(),
        }
        true
    }

    /// Flip a live transfer to Canceled and signal its executor.
    ///
    /// The record transition happens here, synchronously; transport
    /// teardown follows whenever the executor next checks the flag.
    /// Returns false for unknown ids and transfers that already finished.
    pub fn cancel(&self, id: Uuid) -> bool {
        let mut entries = self
            .entries
            .lock()
            .expect("transfer registry lock poisoned");
        let Some(entry) = entries.get_mut(&id) else {
            return false;
        };
        if entry.record.status.is_terminal() {
            return false;
        }
        entry.cancel_flag.store(true, Ordering::SeqCst);
        entry.record.cancel();
        debug!(%id, "transfer canceled");
        true
    }

    /// Current copy of one record
    pub fn get(&self, id: Uuid) -> Option<Transfer> {
        self.entries
            .lock()
            .expect("transfer registry lock poisoned")
            .get(&id)
            .map(|entry| entry.record.clone())
    }

    /// Copies of all records, oldest first
    pub fn snapshot(&self) -> Vec<Transfer> {
        let entries = self
            .entries
            .lock()
            .expect("transfer registry lock poisoned");
        let mut records: Vec<Transfer> =
            entries.values().map(|entry| entry.record.clone()).collect();
        records.sort_by_key(|record| (record.created_at, record.id));
        records
    }

    /// Number of transfers not yet in a terminal state
    pub fn active_count(&self) -> usize {
        self.entries
            .lock()
            .expect("transfer registry lock poisoned")
            .values()
            .filter(|entry| !entry.record.status.is_terminal())
            .count()
    }

    /// Remove a finished record, returning it.
    ///
    /// Live records stay put: acknowledging a transfer that is still
    /// moving returns None and changes nothing.
    pub fn acknowledge(&self, id: Uuid) -> Option<Transfer> {
        let mut entries = self
            .entries
            .lock()
            .expect("transfer registry lock poisoned");
        match entries.get(&id) {
            Some(entry) if entry.record.status.is_terminal() => {
                entries.remove(&id).map(|entry| entry.record)
            }
            _ => None,
        }
    }

    /// Drop every finished record, returning how many were removed
    pub fn clear_finished(&self) -> usize {
        let mut entries = self
            .entries
            .lock()
            .expect("transfer registry lock poisoned");
        let before = entries.len();
        entries.retain(|_, entry| !entry.record.status.is_terminal());
        before - entries.len()
    }

    /// Total number of records, live or finished
    #[cfg(test)]
    fn count(&self) -> usize {
        self.entries
            .lock()
            .expect("transfer registry lock poisoned")
            .len()
    }
}

impl Default for TransferRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
