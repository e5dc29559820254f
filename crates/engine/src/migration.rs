//! Schema migration at store-open time
//!
//! Migration is evaluated exactly once per `open` call, never at field
//! access. The resolution rules, in order:
//!
//! 1. No file on disk: create fresh, stamped with the declared version.
//! 2. Version and persisted shape both match: open directly.
//! 3. Shape matches and the declared version is a strict forward bump of a
//!    versioned file: rewrite the stored version in place, preserving data.
//! 4. Anything else (shape change, version downgrade, transition to or from
//!    the unversioned sentinel): `MigrationNeeded`, file untouched — unless
//!    the delete-on-migration-needed policy is configured, in which case the
//!    file is deleted and recreated fresh at the declared version.
//!
//! Rule 3 plus rule 4 keep the stored version monotone: a successful open
//! never decreases it, and downgrades happen only through the explicit
//! delete policy.

use lodestone_core::{Error, Result, Schema, SchemaVersion, StoreConfig};
use lodestone_storage::format::StoreSnapshot;
use lodestone_storage::snapshot::{read_snapshot, write_snapshot};
use std::path::Path;
use tracing::{debug, info, warn};

/// How an open attempt was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// No file existed; a fresh one was created
    CreatedFresh,
    /// File matched the declared schema and was opened directly
    OpenedExisting,
    /// Version-only forward change; stored version rewritten, data kept
    VersionBumped,
    /// Incompatible file deleted and recreated per policy
    Reset,
}

/// Resolve the on-disk state against the declared schema and configuration
///
/// On success the returned snapshot is the state the store opens with, and
/// the file on disk reflects it.
pub(crate) fn resolve(
    path: &Path,
    schema: &Schema,
    config: &StoreConfig,
) -> Result<(StoreSnapshot, Resolution)> {
    let declared_shape = schema.shape();
    let declared_version = config.schema_version;

    if !path.exists() {
        let snapshot = StoreSnapshot::empty(declared_version, declared_shape);
        write_snapshot(path, &snapshot)?;
        info!(path = %path.display(), version = %declared_version, "created fresh store");
        return Ok((snapshot, Resolution::CreatedFresh));
    }

    let mut on_disk = read_snapshot(path)?;

    if on_disk.schema_version == declared_version && on_disk.shape == declared_shape {
        debug!(path = %path.display(), "on-disk schema matches declaration");
        return Ok((on_disk, Resolution::OpenedExisting));
    }

    if on_disk.shape == declared_shape {
        if let (SchemaVersion::Version(stored), SchemaVersion::Version(declared)) =
            (on_disk.schema_version, declared_version)
        {
            if declared > stored {
                on_disk.schema_version = declared_version;
                write_snapshot(path, &on_disk)?;
                info!(
                    path = %path.display(),
                    from = stored,
                    to = declared,
                    "schema version bumped in place"
                );
                return Ok((on_disk, Resolution::VersionBumped));
            }
        }
    }

    if config.delete_on_migration_needed {
        std::fs::remove_file(path).map_err(|e| Error::FileError {
            path: path.to_path_buf(),
            message: format!("could not delete incompatible store: {}", e),
        })?;
        let snapshot = StoreSnapshot::empty(declared_version, declared_shape);
        write_snapshot(path, &snapshot)?;
        warn!(
            path = %path.display(),
            stored = %on_disk.schema_version,
            declared = %declared_version,
            "incompatible store deleted and recreated"
        );
        return Ok((snapshot, Resolution::Reset));
    }

    Err(Error::MigrationNeeded(describe_mismatch(
        &on_disk,
        &declared_shape,
        declared_version,
    )))
}

fn describe_mismatch(
    on_disk: &StoreSnapshot,
    declared_shape: &lodestone_core::SchemaShape,
    declared_version: SchemaVersion,
) -> String {
    if on_disk.shape != *declared_shape {
        format!(
            "schema shape changed (stored version {}, declared {})",
            on_disk.schema_version, declared_version
        )
    } else {
        format!(
            "stored version {} cannot be reconciled with declared version {}",
            on_disk.schema_version, declared_version
        )
    }
}
