//! Lodestone: an embedded, transactional, object-oriented data store
//!
//! Objects live inside a single on-disk file, are accessed through live
//! in-memory handles, and are mutated only inside explicit write
//! transactions. Multiple handles to the same record share identity: a field
//! write through one handle is immediately visible through every other
//! handle, before and after commit.
//!
//! # Example
//!
//! ```no_run
//! use lodestone::{
//!     FieldType, FieldValue, ObjectSchema, Predicate, PropertySchema, Schema, Store, StoreConfig,
//! };
//!
//! # fn main() -> lodestone::Result<()> {
//! let schema = Schema::new(vec![ObjectSchema::new("Person")
//!     .with_property(PropertySchema::persisted("name", FieldType::String))
//!     .with_property(PropertySchema::persisted("score", FieldType::Float))])?;
//!
//! let store = Store::open("people.lode", schema, StoreConfig::new().with_schema_version(1))?;
//!
//! let tx = store.begin_write()?;
//! let person = store.create("Person")?;
//! person.set("name", "John".into())?;
//! person.set("score", FieldValue::Float(42.42))?;
//! tx.commit()?;
//!
//! let winners = store
//!     .objects("Person")?
//!     .filter(Predicate::gt("score", 40i64));
//! assert_eq!(winners.count()?, 1);
//! # Ok(())
//! # }
//! ```

pub use lodestone_core::{
    ComputedProperty, Error, FieldType, FieldValue, ObjectSchema, PropertySchema, Result, Schema,
    SchemaVersion, StoreConfig,
};
pub use lodestone_engine::{CompareOp, Object, Predicate, Results, ResultsIter, Store, WriteTransaction};
