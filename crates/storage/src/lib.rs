//! On-disk representation and shared record storage for Lodestone
//!
//! This crate owns everything below the engine:
//! - `arena`: the in-memory record arena shared by every live object handle
//! - `format`: the snapshot file layout (header, payload, checksum)
//! - `snapshot`: atomic snapshot write (temp file + rename) and checked read
//! - `lock`: the process-wide registry enforcing one open store per path

pub mod arena;
pub mod format;
pub mod lock;
pub mod snapshot;

pub use arena::{ArenaSnapshot, Record, RecordArena, RecordId};
pub use format::{SnapshotHeader, StoreSnapshot, FORMAT_VERSION, SNAPSHOT_MAGIC};
pub use lock::PathLock;
pub use snapshot::{read_snapshot, write_snapshot};
