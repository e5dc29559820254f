//! Write transaction guard
//!
//! `begin_write` captures the pre-transaction arena state; mutations are then
//! applied directly to the shared arena, which is what makes uncommitted
//! writes immediately visible through every handle in the process. Commit
//! persists the arena atomically; rollback (explicit, or implicit when the
//! guard is dropped without commit) restores the captured state.
//!
//! The guard pattern makes rollback the default outcome: early returns and
//! panics unwind through `Drop`, which rolls back any transaction that was
//! not explicitly committed.

use lodestone_core::{Error, Result};
use lodestone_storage::format::StoreSnapshot;
use lodestone_storage::snapshot::write_snapshot;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::store::StoreInner;

/// An open write transaction on one store
///
/// Exactly one may be open per store. Ends in `commit` (durable) or
/// rollback (discarded); dropping the guard without committing rolls back.
#[must_use = "a write transaction rolls back unless committed"]
pub struct WriteTransaction {
    store: Arc<StoreInner>,
    finished: bool,
}

impl WriteTransaction {
    pub(crate) fn new(store: Arc<StoreInner>) -> Self {
        WriteTransaction {
            store,
            finished: false,
        }
    }

    /// Commit: make all mutations since `begin_write` durable, atomically
    ///
    /// On failure the store is restored to its pre-transaction state, in
    /// memory and on disk — a failed commit never applies partially.
    pub fn commit(mut self) -> Result<()> {
        self.finished = true;
        self.store.ensure_open()?;

        let undo = match self.store.txn.lock().take() {
            Some(undo) => undo,
            None => return Err(Error::OutsideTransaction),
        };

        let snapshot = {
            let arena = self.store.arena.read();
            StoreSnapshot {
                schema_version: self.store.schema_version,
                shape: self.store.schema.shape(),
                next_record_id: arena.next_id(),
                records: arena.persisted_records(),
            }
        };

        match write_snapshot(&self.store.path, &snapshot) {
            Ok(()) => {
                self.store.arena.write().purge_removed();
                debug!(path = %self.store.path.display(), records = snapshot.records.len(), "transaction committed");
                Ok(())
            }
            Err(e) => {
                self.store.arena.write().restore(undo);
                warn!(path = %self.store.path.display(), error = %e, "commit failed, state restored");
                Err(e)
            }
        }
    }

    /// Roll back: discard all mutations since `begin_write`
    pub fn rollback(mut self) {
        self.finished = true;
        rollback_inner(&self.store);
        debug!(path = %self.store.path.display(), "transaction rolled back");
    }
}

impl Drop for WriteTransaction {
    fn drop(&mut self) {
        if !self.finished {
            rollback_inner(&self.store);
            debug!(path = %self.store.path.display(), "transaction rolled back on drop");
        }
    }
}

fn rollback_inner(store: &StoreInner) {
    let mut txn = store.txn.lock();
    if let Some(undo) = txn.take() {
        store.arena.write().restore(undo);
    }
}
