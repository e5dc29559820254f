//! Error types for the Lodestone object store
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Lodestone operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the Lodestone object store
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying file could not be opened, created, or deleted
    #[error("file error at {path:?}: {message}")]
    FileError {
        /// Path of the offending file
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Data corruption detected in the store file
    #[error("data corruption: {0}")]
    Corruption(String),

    /// Mutation attempted without an open write transaction
    #[error("cannot mutate the store outside a write transaction")]
    OutsideTransaction,

    /// A write transaction is already open on this store
    #[error("a write transaction is already in progress")]
    TransactionInProgress,

    /// A required argument was absent or empty
    #[error("required argument missing: {0}")]
    NullArgument(&'static str),

    /// Object is already managed by the store it was handed to
    #[error("object is already managed by this store")]
    AlreadyManagedByThisStore,

    /// Object is managed by a different store
    #[error("object is managed by a different store")]
    ManagedByAnotherStore,

    /// Object is not managed by any store
    #[error("object is not managed by a store")]
    NotManaged,

    /// On-disk schema is incompatible and no auto-resolution was configured
    #[error("migration needed: {0}")]
    MigrationNeeded(String),

    /// Object type is not declared in the store's schema
    #[error("unknown object type: {0}")]
    UnknownObjectType(String),

    /// Property is not declared on the object type
    #[error("unknown property '{property}' on object type '{object_type}'")]
    UnknownProperty {
        /// Object type that was addressed
        object_type: String,
        /// Property name that was not found
        property: String,
    },

    /// Value does not match the property's declared type
    #[error("type mismatch for '{property}': expected {expected}, got {actual}")]
    TypeMismatch {
        /// Property that was addressed
        property: String,
        /// Declared type name
        expected: &'static str,
        /// Type name of the supplied value
        actual: &'static str,
    },

    /// Computed property has no setter
    #[error("property '{0}' is read-only")]
    ReadOnlyProperty(String),

    /// Record was removed; the handle is no longer valid
    #[error("object has been removed from the store")]
    ObjectRemoved,

    /// Store has been closed; all handles bound to it are invalid
    #[error("store has been closed")]
    StoreClosed,

    /// Schema description failed validation
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
