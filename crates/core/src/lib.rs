//! Core types for the Lodestone object store
//!
//! This crate is the leaf of the workspace: it defines the error taxonomy,
//! the typed field values stored in records, the declarative schema
//! description consumed at store-open time, and the store configuration.
//! It has no knowledge of files, transactions, or live objects.

pub mod config;
pub mod error;
pub mod schema;
pub mod value;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use schema::{
    ComputedProperty, ObjectSchema, PropertySchema, Schema, SchemaShape, SchemaVersion,
};
pub use value::{FieldType, FieldValue};
