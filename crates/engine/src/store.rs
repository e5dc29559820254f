//! Store lifecycle and shared state
//!
//! A `Store` is one on-disk file plus its open schema. All live state hangs
//! off `StoreInner`: object handles hold an `Arc<StoreInner>` and a record
//! id, nothing else, so every handle to a record reads and writes the same
//! arena slot.
//!
//! Closing (explicitly or on drop) forces rollback of any open write
//! transaction, releases the path lock, and invalidates every handle bound
//! to the store.

use lodestone_core::{Error, Result, Schema, SchemaVersion, StoreConfig};
use lodestone_storage::arena::{ArenaSnapshot, RecordArena};
use lodestone_storage::lock::{self, PathLock};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::migration;
use crate::transaction::WriteTransaction;

/// Shared state behind one open store
///
/// Lock order, where both are taken: `txn` before `arena`.
pub(crate) struct StoreInner {
    pub(crate) path: PathBuf,
    pub(crate) schema: Schema,
    pub(crate) schema_version: SchemaVersion,
    pub(crate) arena: RwLock<RecordArena>,
    /// `None` = idle; `Some(undo)` = a write transaction is open and `undo`
    /// is the pre-transaction arena state
    pub(crate) txn: Mutex<Option<ArenaSnapshot>>,
    pub(crate) open: AtomicBool,
    path_lock: Mutex<Option<PathLock>>,
}

impl StoreInner {
    /// Fail with `StoreClosed` if the store is no longer open
    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::StoreClosed)
        }
    }

    /// Fail with `OutsideTransaction` unless a write transaction is open
    pub(crate) fn ensure_writing(&self) -> Result<()> {
        if self.txn.lock().is_some() {
            Ok(())
        } else {
            Err(Error::OutsideTransaction)
        }
    }
}

/// An open Lodestone store
///
/// The `Store` value is the owner of the open file: dropping it closes the
/// store. Object handles and query results keep the shared state alive but
/// observe `StoreClosed` once the store is closed.
pub struct Store {
    pub(crate) inner: Arc<StoreInner>,
}

impl Store {
    /// Open or create the store at `path`
    ///
    /// A missing file is created fresh and stamped with the declared schema
    /// version. An existing file goes through the migration engine before
    /// this returns; see the `migration` module for the resolution rules.
    pub fn open(path: impl AsRef<Path>, schema: Schema, config: StoreConfig) -> Result<Store> {
        let path = path.as_ref().to_path_buf();
        let path_lock = PathLock::acquire(&path)?;

        let (snapshot, resolution) = migration::resolve(&path, &schema, &config)?;
        info!(
            path = %path.display(),
            version = %snapshot.schema_version,
            ?resolution,
            "store opened"
        );

        let arena = RecordArena::from_records(snapshot.records, snapshot.next_record_id);
        Ok(Store {
            inner: Arc::new(StoreInner {
                path,
                schema,
                schema_version: snapshot.schema_version,
                arena: RwLock::new(arena),
                txn: Mutex::new(None),
                open: AtomicBool::new(true),
                path_lock: Mutex::new(Some(path_lock)),
            }),
        })
    }

    /// Close the store
    ///
    /// Any open write transaction is rolled back. Equivalent to dropping the
    /// store; provided for callers that want the close to be explicit.
    pub fn close(self) {
        // Drop impl does the work
    }

    /// Delete the store file at `path`
    ///
    /// Fails with `FileError` if a store at that path is currently open.
    pub fn delete(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if lock::is_locked(path) {
            return Err(Error::FileError {
                path: path.to_path_buf(),
                message: "cannot delete: store is currently open".to_string(),
            });
        }
        std::fs::remove_file(path).map_err(|e| Error::FileError {
            path: path.to_path_buf(),
            message: format!("could not delete store file: {}", e),
        })?;
        info!(path = %path.display(), "store file deleted");
        Ok(())
    }

    /// Begin a write transaction
    ///
    /// Only one write transaction may be open at a time; a nested begin
    /// fails with `TransactionInProgress`. The returned guard rolls back on
    /// drop unless `commit` is called.
    pub fn begin_write(&self) -> Result<WriteTransaction> {
        self.inner.ensure_open()?;
        let mut txn = self.inner.txn.lock();
        if txn.is_some() {
            return Err(Error::TransactionInProgress);
        }
        *txn = Some(self.inner.arena.read().snapshot());
        Ok(WriteTransaction::new(Arc::clone(&self.inner)))
    }

    /// Whether a write transaction is currently open
    pub fn is_in_transaction(&self) -> bool {
        self.inner.txn.lock().is_some()
    }

    /// Schema version the store is stamped with
    pub fn schema_version(&self) -> SchemaVersion {
        self.inner.schema_version
    }

    /// Path of the store file
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    fn close_internal(&self) {
        if !self.inner.open.swap(false, Ordering::SeqCst) {
            return;
        }
        let mut txn = self.inner.txn.lock();
        if let Some(undo) = txn.take() {
            self.inner.arena.write().restore(undo);
            warn!(path = %self.inner.path.display(), "open write transaction rolled back at close");
        }
        drop(txn);
        *self.inner.path_lock.lock() = None;
        info!(path = %self.inner.path.display(), "store closed");
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        self.close_internal();
    }
}
