//! Live object handles
//!
//! An `Object` is a caller-visible reference to one logical record. Handles
//! are cheap to clone; clones share state. A handle is in one of two
//! structural states:
//!
//! - **unmanaged**: freshly constructed, fields held locally in the handle
//! - **managed**: bound to one store and one record; all field access routes
//!   through the record's canonical arena slot, so a write through any handle
//!   is immediately visible through every other handle on the same record
//!
//! A removed record is the third logical state: the tombstoned slot stays
//! addressable so access fails with `ObjectRemoved` instead of silently
//! succeeding.
//!
//! Computed properties are dispatched here: reading recomputes from the
//! current source values, writing decomposes into the persisted sources
//! within the same transaction.

use lodestone_core::{Error, FieldValue, ObjectSchema, Result};
use lodestone_storage::arena::{Record, RecordId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::store::{Store, StoreInner};

enum ObjectState {
    Unmanaged {
        type_name: String,
        fields: HashMap<String, FieldValue>,
    },
    Managed {
        store: Arc<StoreInner>,
        record: RecordId,
    },
}

/// A handle to one logical record
///
/// Equality is identity-based: two handles are equal when they reference the
/// same record of the same store (or share unmanaged state), never because
/// their field values happen to match.
#[derive(Clone)]
pub struct Object {
    state: Arc<RwLock<ObjectState>>,
}

impl Object {
    /// Create a fresh unmanaged object of the given type
    ///
    /// Field access on an unmanaged object is local to the handle (and its
    /// clones) until the object is managed by a store.
    pub fn new(type_name: &str) -> Result<Object> {
        if type_name.is_empty() {
            return Err(Error::NullArgument("object type name"));
        }
        Ok(Object {
            state: Arc::new(RwLock::new(ObjectState::Unmanaged {
                type_name: type_name.to_string(),
                fields: HashMap::new(),
            })),
        })
    }

    pub(crate) fn managed(store: Arc<StoreInner>, record: RecordId) -> Object {
        Object {
            state: Arc::new(RwLock::new(ObjectState::Managed { store, record })),
        }
    }

    /// Object type name
    pub fn type_name(&self) -> String {
        match &*self.state.read() {
            ObjectState::Unmanaged { type_name, .. } => type_name.clone(),
            ObjectState::Managed { store, record } => store
                .arena
                .read()
                .get(*record)
                .map(|r| r.type_name.clone())
                .unwrap_or_default(),
        }
    }

    /// Whether this handle is bound to a store
    pub fn is_managed(&self) -> bool {
        matches!(&*self.state.read(), ObjectState::Managed { .. })
    }

    /// Whether the handle can still be read through
    ///
    /// False for managed handles whose record was removed or whose store was
    /// closed; true for unmanaged handles.
    pub fn is_valid(&self) -> bool {
        match &*self.state.read() {
            ObjectState::Unmanaged { .. } => true,
            ObjectState::Managed { store, record } => {
                store.ensure_open().is_ok()
                    && store
                        .arena
                        .read()
                        .get(*record)
                        .map(|r| !r.removed)
                        .unwrap_or(false)
            }
        }
    }

    /// Read a field
    ///
    /// Allowed in any transaction state. Managed reads go through the shared
    /// record slot; computed properties recompute from current source values.
    pub fn get(&self, name: &str) -> Result<FieldValue> {
        if name.is_empty() {
            return Err(Error::NullArgument("property name"));
        }
        match &*self.state.read() {
            ObjectState::Unmanaged { fields, .. } => {
                Ok(fields.get(name).cloned().unwrap_or(FieldValue::Null))
            }
            ObjectState::Managed { store, record } => store.get_field(*record, name),
        }
    }

    /// Write a field
    ///
    /// Managed writes to persisted or computed properties require an open
    /// write transaction and fail with `OutsideTransaction` otherwise, with
    /// no mutation performed. Ignored properties are transient per-record
    /// state and are writable at any time.
    pub fn set(&self, name: &str, value: FieldValue) -> Result<()> {
        if name.is_empty() {
            return Err(Error::NullArgument("property name"));
        }
        match &mut *self.state.write() {
            ObjectState::Unmanaged { fields, .. } => {
                fields.insert(name.to_string(), value);
                Ok(())
            }
            ObjectState::Managed { store, record } => store.set_field(*record, name, value),
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.read() {
            ObjectState::Unmanaged { type_name, .. } => f
                .debug_struct("Object")
                .field("type_name", type_name)
                .field("managed", &false)
                .finish(),
            ObjectState::Managed { record, .. } => f
                .debug_struct("Object")
                .field("record", record)
                .field("managed", &true)
                .finish(),
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.state, &other.state) {
            return true;
        }
        let a = self.state.read();
        let b = other.state.read();
        match (&*a, &*b) {
            (
                ObjectState::Managed {
                    store: s1,
                    record: r1,
                },
                ObjectState::Managed {
                    store: s2,
                    record: r2,
                },
            ) => Arc::ptr_eq(s1, s2) && r1 == r2,
            // distinct unmanaged handles never alias a record
            _ => false,
        }
    }
}

impl Eq for Object {}

enum PropertyKind {
    Persisted(lodestone_core::FieldType),
    Ignored(lodestone_core::FieldType),
    Computed,
}

impl StoreInner {
    fn object_schema(&self, type_name: &str) -> Result<&ObjectSchema> {
        self.schema
            .object(type_name)
            .ok_or_else(|| Error::UnknownObjectType(type_name.to_string()))
    }

    fn classify(&self, type_name: &str, property: &str) -> Result<PropertyKind> {
        let obj_schema = self.object_schema(type_name)?;
        if obj_schema.computed(property).is_some() {
            return Ok(PropertyKind::Computed);
        }
        match obj_schema.property(property) {
            Some(p) if p.persisted => Ok(PropertyKind::Persisted(p.field_type)),
            Some(p) => Ok(PropertyKind::Ignored(p.field_type)),
            None => Err(Error::UnknownProperty {
                object_type: type_name.to_string(),
                property: property.to_string(),
            }),
        }
    }

    fn record_type(&self, record: RecordId) -> Result<String> {
        let arena = self.arena.read();
        let rec = arena.get(record).ok_or(Error::ObjectRemoved)?;
        if rec.removed {
            return Err(Error::ObjectRemoved);
        }
        Ok(rec.type_name.clone())
    }

    pub(crate) fn get_field(&self, record: RecordId, name: &str) -> Result<FieldValue> {
        self.ensure_open()?;
        let type_name = self.record_type(record)?;
        let obj_schema = self.object_schema(&type_name)?;

        let arena = self.arena.read();
        let rec = arena.get(record).ok_or(Error::ObjectRemoved)?;
        if rec.removed {
            return Err(Error::ObjectRemoved);
        }

        if let Some(computed) = obj_schema.computed(name) {
            let sources: Vec<FieldValue> = computed
                .sources
                .iter()
                .map(|s| rec.fields.get(s).cloned().unwrap_or(FieldValue::Null))
                .collect();
            return Ok((computed.compose)(&sources));
        }

        match obj_schema.property(name) {
            Some(p) if p.persisted => Ok(rec
                .fields
                .get(name)
                .cloned()
                .unwrap_or_else(|| p.field_type.default_value())),
            Some(p) => Ok(rec
                .transient
                .get(name)
                .cloned()
                .unwrap_or_else(|| p.field_type.default_value())),
            None => Err(Error::UnknownProperty {
                object_type: type_name.clone(),
                property: name.to_string(),
            }),
        }
    }

    pub(crate) fn set_field(&self, record: RecordId, name: &str, value: FieldValue) -> Result<()> {
        self.ensure_open()?;
        let type_name = self.record_type(record)?;

        // Classify before taking the arena write lock; `txn` is locked inside
        // ensure_writing and must always come before `arena`.
        match self.classify(&type_name, name)? {
            PropertyKind::Ignored(field_type) => {
                check_type(name, field_type, &value)?;
                let mut arena = self.arena.write();
                let rec = live_record_mut(&mut arena, record)?;
                rec.transient.insert(name.to_string(), value);
                Ok(())
            }
            PropertyKind::Persisted(declared) => {
                self.ensure_writing()?;
                check_type(name, declared, &value)?;
                let mut arena = self.arena.write();
                let rec = live_record_mut(&mut arena, record)?;
                rec.fields.insert(name.to_string(), value);
                Ok(())
            }
            PropertyKind::Computed => {
                self.ensure_writing()?;
                let obj_schema = self.object_schema(&type_name)?;
                let computed =
                    computed_or_unknown(obj_schema, &type_name, name)?;
                let decompose = computed
                    .decompose
                    .ok_or_else(|| Error::ReadOnlyProperty(name.to_string()))?;
                let parts = decompose(&value)?;
                if parts.len() != computed.sources.len() {
                    return Err(Error::InvalidSchema(format!(
                        "decompose for '{}' produced {} values for {} sources",
                        name,
                        parts.len(),
                        computed.sources.len()
                    )));
                }
                for (source, part) in computed.sources.iter().zip(&parts) {
                    let declared = obj_schema
                        .property(source)
                        .map(|p| p.field_type)
                        .ok_or_else(|| Error::UnknownProperty {
                            object_type: type_name.clone(),
                            property: source.clone(),
                        })?;
                    check_type(source, declared, part)?;
                }
                let mut arena = self.arena.write();
                let rec = live_record_mut(&mut arena, record)?;
                for (source, part) in computed.sources.iter().zip(parts) {
                    rec.fields.insert(source.clone(), part);
                }
                Ok(())
            }
        }
    }
}

fn computed_or_unknown<'a>(
    obj_schema: &'a ObjectSchema,
    type_name: &str,
    name: &str,
) -> Result<&'a lodestone_core::ComputedProperty> {
    obj_schema
        .computed(name)
        .ok_or_else(|| Error::UnknownProperty {
            object_type: type_name.to_string(),
            property: name.to_string(),
        })
}

fn live_record_mut<'a>(
    arena: &'a mut lodestone_storage::arena::RecordArena,
    record: RecordId,
) -> Result<&'a mut Record> {
    let rec = arena.get_mut(record).ok_or(Error::ObjectRemoved)?;
    if rec.removed {
        return Err(Error::ObjectRemoved);
    }
    Ok(rec)
}

fn check_type(
    property: &str,
    declared: lodestone_core::FieldType,
    value: &FieldValue,
) -> Result<()> {
    match value.field_type() {
        Some(actual) if actual == declared => Ok(()),
        _ => Err(Error::TypeMismatch {
            property: property.to_string(),
            expected: declared.name(),
            actual: value.type_name(),
        }),
    }
}

impl Store {
    /// Create a new managed object with default field values
    ///
    /// Requires an open write transaction.
    pub fn create(&self, type_name: &str) -> Result<Object> {
        if type_name.is_empty() {
            return Err(Error::NullArgument("object type name"));
        }
        self.inner.ensure_open()?;
        self.inner.ensure_writing()?;
        let obj_schema = self.inner.object_schema(type_name)?;

        let mut fields = HashMap::new();
        let mut transient = HashMap::new();
        for p in &obj_schema.properties {
            let target = if p.persisted {
                &mut fields
            } else {
                &mut transient
            };
            target.insert(p.name.clone(), p.field_type.default_value());
        }

        let mut record = Record::new(type_name, fields);
        record.transient = transient;
        let id = self.inner.arena.write().allocate(record);
        Ok(Object::managed(Arc::clone(&self.inner), id))
    }

    /// Bind an unmanaged object's current field values into this store
    ///
    /// Field values are copied at call time. After success the handle (and
    /// every clone of it) is managed by this store. An object may be managed
    /// exactly once, by exactly one store.
    pub fn manage(&self, object: &Object) -> Result<()> {
        self.inner.ensure_open()?;
        self.inner.ensure_writing()?;

        let mut state = object.state.write();
        let (type_name, local_fields) = match &*state {
            ObjectState::Managed { store, .. } => {
                return if Arc::ptr_eq(store, &self.inner) {
                    Err(Error::AlreadyManagedByThisStore)
                } else {
                    Err(Error::ManagedByAnotherStore)
                };
            }
            ObjectState::Unmanaged { type_name, fields } => (type_name.clone(), fields.clone()),
        };

        let obj_schema = self.inner.object_schema(&type_name)?;
        let mut fields = HashMap::new();
        let mut transient = HashMap::new();
        for p in &obj_schema.properties {
            let value = match local_fields.get(&p.name) {
                Some(v) if !v.is_null() => {
                    check_type(&p.name, p.field_type, v)?;
                    v.clone()
                }
                _ => p.field_type.default_value(),
            };
            if p.persisted {
                fields.insert(p.name.clone(), value);
            } else {
                transient.insert(p.name.clone(), value);
            }
        }

        let mut record = Record::new(type_name, fields);
        record.transient = transient;
        let id = self.inner.arena.write().allocate(record);
        *state = ObjectState::Managed {
            store: Arc::clone(&self.inner),
            record: id,
        };
        Ok(())
    }

    /// Remove a managed object's record from this store
    ///
    /// Requires an open write transaction. Every handle referencing the
    /// record transitions to the removed state.
    pub fn remove(&self, object: &Object) -> Result<()> {
        self.inner.ensure_open()?;
        self.inner.ensure_writing()?;

        let state = object.state.read();
        match &*state {
            ObjectState::Unmanaged { .. } => Err(Error::NotManaged),
            ObjectState::Managed { store, record } => {
                if !Arc::ptr_eq(store, &self.inner) {
                    return Err(Error::ManagedByAnotherStore);
                }
                let mut arena = self.inner.arena.write();
                // already-removed records fail here instead of silently
                // tombstoning twice
                live_record_mut(&mut arena, *record)?;
                arena.mark_removed(*record);
                Ok(())
            }
        }
    }
}
