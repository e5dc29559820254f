//! Store configuration
//!
//! Carries the declared schema version and the migration-resolution policy.
//! The default configuration is unversioned and fails open attempts that
//! would need migration.

use crate::schema::SchemaVersion;

/// Configuration passed to `Store::open`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Declared schema version stamped on freshly created stores
    pub schema_version: SchemaVersion,
    /// When the on-disk schema is incompatible, delete the file and recreate
    /// it fresh at the declared version instead of failing
    pub delete_on_migration_needed: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            schema_version: SchemaVersion::Unversioned,
            delete_on_migration_needed: false,
        }
    }
}

impl StoreConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit schema version (builder style)
    pub fn with_schema_version(mut self, version: u64) -> Self {
        self.schema_version = SchemaVersion::Version(version);
        self
    }

    /// Enable delete-and-recreate resolution for incompatible files
    pub fn with_delete_on_migration_needed(mut self, delete: bool) -> Self {
        self.delete_on_migration_needed = delete;
        self
    }
}
