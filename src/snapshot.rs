//! Snapshot Store
//!
//! Holds the most recent successfully parsed [`RawSnapshot`] for one inverter.
//! Publishing swaps the whole `Arc`, so a reader sees either the old snapshot or
//! the new one, never a mix. Failed polls do not touch the store.

use crate::solax::types::RawSnapshot;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct SnapshotStore {
    sender: Arc<watch::Sender<Option<Arc<RawSnapshot>>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Replace the current snapshot.
    pub fn publish(&self, snapshot: RawSnapshot) -> Arc<RawSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.sender.send_replace(Some(snapshot.clone()));
        snapshot
    }

    /// Current snapshot, if any poll has succeeded yet.
    pub fn current(&self) -> Option<Arc<RawSnapshot>> {
        self.sender.borrow().clone()
    }

    /// Receiver notified on every publish.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<RawSnapshot>>> {
        self.sender.subscribe()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
