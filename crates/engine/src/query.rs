//! Predicate queries over live objects
//!
//! `Store::objects` returns a lazy, restartable `Results`: nothing is
//! evaluated until the sequence is consumed, and each consumption (`iter`,
//! `count`, `first`) re-evaluates against the current live state — including
//! uncommitted in-process writes.
//!
//! Results preserve record-creation order, so repeated materialization is
//! deterministic and index-addressable.
//!
//! Equality operators compare exactly on the stored representation: a value
//! stored at single precision matches only a single-precision operand with
//! the same bits. Ordering operators widen numerics to f64.

use lodestone_core::{Error, FieldValue, ObjectSchema, Result};
use lodestone_storage::arena::{Record, RecordId};
use std::cmp::Ordering;
use std::sync::Arc;

use crate::object::Object;
use crate::store::{Store, StoreInner};

/// The six comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Exact equality on the stored representation
    Eq,
    /// Exact inequality on the stored representation
    Ne,
    /// Less than (numeric or lexicographic)
    Lt,
    /// Less than or equal
    Le,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
}

/// A comparison over one persisted scalar field
#[derive(Debug, Clone)]
pub struct Predicate {
    property: String,
    op: CompareOp,
    value: FieldValue,
}

impl Predicate {
    /// Build a predicate from parts
    pub fn new(property: impl Into<String>, op: CompareOp, value: impl Into<FieldValue>) -> Self {
        Predicate {
            property: property.into(),
            op,
            value: value.into(),
        }
    }

    /// `property == value`
    pub fn eq(property: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(property, CompareOp::Eq, value)
    }

    /// `property != value`
    pub fn ne(property: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(property, CompareOp::Ne, value)
    }

    /// `property < value`
    pub fn lt(property: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(property, CompareOp::Lt, value)
    }

    /// `property <= value`
    pub fn le(property: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(property, CompareOp::Le, value)
    }

    /// `property > value`
    pub fn gt(property: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(property, CompareOp::Gt, value)
    }

    /// `property >= value`
    pub fn ge(property: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(property, CompareOp::Ge, value)
    }

    fn matches(&self, obj_schema: &ObjectSchema, record: &Record) -> Result<bool> {
        match obj_schema.property(&self.property) {
            Some(p) if p.persisted => {}
            // ignored and computed properties are invisible to queries
            _ => {
                return Err(Error::UnknownProperty {
                    object_type: obj_schema.name.clone(),
                    property: self.property.clone(),
                })
            }
        }
        let stored = record
            .fields
            .get(&self.property)
            .cloned()
            .unwrap_or(FieldValue::Null);

        match self.op {
            CompareOp::Eq => Ok(stored == self.value),
            CompareOp::Ne => Ok(stored != self.value),
            CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => {
                let ordering = self.order(&stored)?;
                Ok(match self.op {
                    CompareOp::Lt => ordering == Ordering::Less,
                    CompareOp::Le => ordering != Ordering::Greater,
                    CompareOp::Gt => ordering == Ordering::Greater,
                    CompareOp::Ge => ordering != Ordering::Less,
                    _ => unreachable!(),
                })
            }
        }
    }

    fn order(&self, stored: &FieldValue) -> Result<Ordering> {
        if let (Some(a), Some(b)) = (stored.as_numeric(), self.value.as_numeric()) {
            return a.partial_cmp(&b).ok_or_else(|| Error::TypeMismatch {
                property: self.property.clone(),
                expected: "comparable number",
                actual: "NaN",
            });
        }
        if let (Some(a), Some(b)) = (stored.as_str(), self.value.as_str()) {
            return Ok(a.cmp(b));
        }
        Err(Error::TypeMismatch {
            property: self.property.clone(),
            expected: "ordered scalar",
            actual: stored.type_name(),
        })
    }
}

/// A lazy, restartable sequence of managed objects of one type
#[derive(Clone)]
pub struct Results {
    store: Arc<StoreInner>,
    type_name: String,
    predicates: Vec<Predicate>,
}

impl Results {
    /// Narrow the sequence by another predicate; composes lazily
    pub fn filter(mut self, predicate: Predicate) -> Results {
        self.predicates.push(predicate);
        self
    }

    /// Evaluate and iterate the matching objects in creation order
    pub fn iter(&self) -> Result<ResultsIter> {
        let ids = self.matching_ids()?;
        Ok(ResultsIter {
            store: Arc::clone(&self.store),
            ids: ids.into_iter(),
        })
    }

    /// Number of matching objects, without materializing handles
    pub fn count(&self) -> Result<usize> {
        self.evaluate(|_| {})
    }

    /// First matching object, if any
    pub fn first(&self) -> Result<Option<Object>> {
        Ok(self.iter()?.next())
    }

    /// Matching object at `index` in creation order
    pub fn get(&self, index: usize) -> Result<Option<Object>> {
        Ok(self.iter()?.nth(index))
    }

    /// Whether the sequence is empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.count()? == 0)
    }

    fn matching_ids(&self) -> Result<Vec<RecordId>> {
        let mut ids = Vec::new();
        self.evaluate(|id| ids.push(id))?;
        Ok(ids)
    }

    /// Single evaluation pass in creation order; calls `found` per match and
    /// returns the match count.
    fn evaluate(&self, mut found: impl FnMut(RecordId)) -> Result<usize> {
        self.store.ensure_open()?;
        let obj_schema = self
            .store
            .schema
            .object(&self.type_name)
            .ok_or_else(|| Error::UnknownObjectType(self.type_name.clone()))?;

        let arena = self.store.arena.read();
        let mut count = 0;
        'records: for (id, record) in arena.iter_type(&self.type_name) {
            for predicate in &self.predicates {
                if !predicate.matches(obj_schema, record)? {
                    continue 'records;
                }
            }
            count += 1;
            found(id);
        }
        Ok(count)
    }
}

/// Iterator over one materialization of a `Results` sequence
pub struct ResultsIter {
    store: Arc<StoreInner>,
    ids: std::vec::IntoIter<RecordId>,
}

impl Iterator for ResultsIter {
    type Item = Object;

    fn next(&mut self) -> Option<Object> {
        self.ids
            .next()
            .map(|id| Object::managed(Arc::clone(&self.store), id))
    }
}

impl ExactSizeIterator for ResultsIter {
    fn len(&self) -> usize {
        self.ids.len()
    }
}

impl Store {
    /// All live objects of `type_name`, as a lazy restartable sequence
    pub fn objects(&self, type_name: &str) -> Result<Results> {
        if type_name.is_empty() {
            return Err(Error::NullArgument("object type name"));
        }
        self.inner.ensure_open()?;
        if self.inner.schema.object(type_name).is_none() {
            return Err(Error::UnknownObjectType(type_name.to_string()));
        }
        Ok(Results {
            store: Arc::clone(&self.inner),
            type_name: type_name.to_string(),
            predicates: Vec::new(),
        })
    }
}
