//! Record arena: canonical shared storage for live objects
//!
//! Every managed object handle resolves to a `(store, RecordId)` pair; the
//! record's fields live in exactly one place, this arena. That single owned
//! slot is what makes live propagation work: a write through one handle is a
//! write into the slot every other handle reads from.
//!
//! # Design notes
//!
//! - `BTreeMap<RecordId, Record>` with monotonically allocated ids gives
//!   stable creation-order iteration, which the query engine's ordering
//!   guarantee is built on.
//! - Removal leaves a tombstone (`removed: true`) so outstanding handles can
//!   distinguish "removed" from "never existed". Tombstones are dropped when
//!   the enclosing transaction commits and are never persisted.
//! - Rollback support is a deep clone of the whole arena taken at
//!   begin-write. O(n), acceptable for a single-process embedded store.

use lodestone_core::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Stable index of a record inside one store
pub type RecordId = u64;

/// One logical record: persisted fields plus transient state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Object type this record belongs to
    pub type_name: String,
    /// Persisted field values, keyed by property name
    pub fields: HashMap<String, FieldValue>,
    /// Ignored-property values; shared between handles but never persisted
    #[serde(skip)]
    pub transient: HashMap<String, FieldValue>,
    /// Tombstone flag set by `remove`
    #[serde(skip)]
    pub removed: bool,
}

impl Record {
    /// Create a record with the given persisted field values
    pub fn new(type_name: impl Into<String>, fields: HashMap<String, FieldValue>) -> Self {
        Record {
            type_name: type_name.into(),
            fields,
            transient: HashMap::new(),
            removed: false,
        }
    }
}

/// Point-in-time copy of the arena, used for transaction rollback
#[derive(Debug, Clone)]
pub struct ArenaSnapshot {
    records: BTreeMap<RecordId, Record>,
    next_id: RecordId,
}

/// Insertion-ordered storage for all records of one store
#[derive(Debug, Default)]
pub struct RecordArena {
    records: BTreeMap<RecordId, Record>,
    next_id: RecordId,
}

impl RecordArena {
    /// Create an empty arena
    pub fn new() -> Self {
        RecordArena {
            records: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Rebuild an arena from persisted records
    ///
    /// Record ids are preserved so that creation order survives a reopen.
    pub fn from_records(records: Vec<(RecordId, Record)>, next_id: RecordId) -> Self {
        RecordArena {
            records: records.into_iter().collect(),
            next_id,
        }
    }

    /// Allocate a new record, returning its stable id
    pub fn allocate(&mut self, record: Record) -> RecordId {
        let id = self.next_id;
        self.next_id += 1;
        self.records.insert(id, record);
        id
    }

    /// Next id that would be allocated
    pub fn next_id(&self) -> RecordId {
        self.next_id
    }

    /// Get a record by id (tombstones included)
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.get(&id)
    }

    /// Get a mutable record by id (tombstones included)
    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut Record> {
        self.records.get_mut(&id)
    }

    /// Mark a record removed; returns false if the id is unknown
    pub fn mark_removed(&mut self, id: RecordId) -> bool {
        match self.records.get_mut(&id) {
            Some(record) => {
                record.removed = true;
                true
            }
            None => false,
        }
    }

    /// Drop all tombstoned records (called after a successful commit)
    pub fn purge_removed(&mut self) {
        self.records.retain(|_, record| !record.removed);
    }

    /// Iterate live (non-removed) records of one type in creation order
    pub fn iter_type<'a>(
        &'a self,
        type_name: &'a str,
    ) -> impl Iterator<Item = (RecordId, &'a Record)> + 'a {
        self.records
            .iter()
            .filter(move |(_, r)| !r.removed && r.type_name == type_name)
            .map(|(&id, r)| (id, r))
    }

    /// Number of live records across all types
    pub fn len(&self) -> usize {
        self.records.values().filter(|r| !r.removed).count()
    }

    /// Whether the arena holds no live records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live records in creation order, for persistence
    pub fn persisted_records(&self) -> Vec<(RecordId, Record)> {
        self.records
            .iter()
            .filter(|(_, r)| !r.removed)
            .map(|(&id, r)| (id, r.clone()))
            .collect()
    }

    /// Deep copy for rollback
    pub fn snapshot(&self) -> ArenaSnapshot {
        ArenaSnapshot {
            records: self.records.clone(),
            next_id: self.next_id,
        }
    }

    /// Restore the state captured by `snapshot`
    pub fn restore(&mut self, snapshot: ArenaSnapshot) {
        self.records = snapshot.records;
        self.next_id = snapshot.next_id;
    }
}
