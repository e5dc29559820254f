//! Declarative schema description
//!
//! The schema is the contract between the host-side model layer (which
//! declares object types and their fields) and the engine. The engine only
//! ever sees the result of that declaration: an ordered list of
//! `(name, type, persisted)` per object type, plus optional computed
//! properties.
//!
//! Properties marked `persisted: false` ("ignored") are invisible to the
//! on-disk layout, the query engine, and the migration engine. They are kept
//! in the declaration so the live object layer can still route access to
//! transient per-record storage, but they never contribute to the schema
//! shape.

use crate::error::{Error, Result};
use crate::value::{FieldType, FieldValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Store-wide schema version
///
/// `Unversioned` is a distinguished sentinel used when no version was
/// declared. It is distinct from `Version(0)`: a store stamped with version 0
/// was explicitly versioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaVersion {
    /// No schema version was declared
    Unversioned,
    /// Explicit schema version
    Version(u64),
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaVersion::Unversioned => write!(f, "unversioned"),
            SchemaVersion::Version(v) => write!(f, "{}", v),
        }
    }
}

/// A single declared property of an object type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySchema {
    /// Property name
    pub name: String,
    /// Declared storage type
    pub field_type: FieldType,
    /// Whether the property is persisted; `false` marks an ignored property
    pub persisted: bool,
}

impl PropertySchema {
    /// Declare a persisted property
    pub fn persisted(name: impl Into<String>, field_type: FieldType) -> Self {
        PropertySchema {
            name: name.into(),
            field_type,
            persisted: true,
        }
    }

    /// Declare an ignored property (kept on the object, never stored)
    pub fn ignored(name: impl Into<String>, field_type: FieldType) -> Self {
        PropertySchema {
            name: name.into(),
            field_type,
            persisted: false,
        }
    }
}

/// A computed (virtual) property
///
/// Reading composes a value from the current values of the `sources`
/// properties; the result is never cached. Writing, if `decompose` is
/// present, fans the input out into the source properties within the same
/// write transaction. A computed property without `decompose` is read-only.
#[derive(Clone)]
pub struct ComputedProperty {
    /// Property name
    pub name: String,
    /// Persisted properties this is computed from, in composition order
    pub sources: Vec<String>,
    /// Compose a value from the current source values (same order as `sources`)
    pub compose: fn(&[FieldValue]) -> FieldValue,
    /// Decompose an input into one value per source, or None for read-only
    pub decompose: Option<fn(&FieldValue) -> Result<Vec<FieldValue>>>,
}

impl fmt::Debug for ComputedProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedProperty")
            .field("name", &self.name)
            .field("sources", &self.sources)
            .field("settable", &self.decompose.is_some())
            .finish()
    }
}

/// A named record shape: ordered properties plus computed properties
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    /// Object type name
    pub name: String,
    /// Declared properties in declaration order
    pub properties: Vec<PropertySchema>,
    /// Computed properties
    pub computed: Vec<ComputedProperty>,
}

impl ObjectSchema {
    /// Create an object schema with the given type name
    pub fn new(name: impl Into<String>) -> Self {
        ObjectSchema {
            name: name.into(),
            properties: Vec::new(),
            computed: Vec::new(),
        }
    }

    /// Add a property (builder style)
    pub fn with_property(mut self, property: PropertySchema) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a computed property (builder style)
    pub fn with_computed(mut self, computed: ComputedProperty) -> Self {
        self.computed.push(computed);
        self
    }

    /// Look up a declared property by name
    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Look up a computed property by name
    pub fn computed(&self, name: &str) -> Option<&ComputedProperty> {
        self.computed.iter().find(|c| c.name == name)
    }

    /// Iterate the persisted properties in declaration order
    pub fn persisted_properties(&self) -> impl Iterator<Item = &PropertySchema> {
        self.properties.iter().filter(|p| p.persisted)
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::NullArgument("object type name"));
        }
        let mut seen = std::collections::HashSet::new();
        for p in &self.properties {
            if p.name.is_empty() {
                return Err(Error::NullArgument("property name"));
            }
            if !seen.insert(p.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate property '{}' on '{}'",
                    p.name, self.name
                )));
            }
        }
        for c in &self.computed {
            if c.name.is_empty() {
                return Err(Error::NullArgument("computed property name"));
            }
            if !seen.insert(c.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "computed property '{}' collides with a declared property on '{}'",
                    c.name, self.name
                )));
            }
            for source in &c.sources {
                match self.property(source) {
                    Some(p) if p.persisted => {}
                    Some(_) => {
                        return Err(Error::InvalidSchema(format!(
                            "computed property '{}' maps to ignored property '{}'",
                            c.name, source
                        )))
                    }
                    None => {
                        return Err(Error::InvalidSchema(format!(
                            "computed property '{}' maps to unknown property '{}'",
                            c.name, source
                        )))
                    }
                }
            }
        }
        Ok(())
    }
}

/// Canonical persisted shape of a schema, used for migration comparison
///
/// Maps object type name to its persisted `(name, type)` pairs in declaration
/// order. Ignored and computed properties never appear here.
pub type SchemaShape = BTreeMap<String, Vec<(String, FieldType)>>;

/// The full schema declared for one store
#[derive(Debug, Clone, Default)]
pub struct Schema {
    objects: Vec<ObjectSchema>,
}

impl Schema {
    /// Build a schema from object declarations, validating each
    pub fn new(objects: Vec<ObjectSchema>) -> Result<Self> {
        let mut names = std::collections::HashSet::new();
        for object in &objects {
            object.validate()?;
            if !names.insert(object.name.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate object type '{}'",
                    object.name
                )));
            }
        }
        Ok(Schema { objects })
    }

    /// Look up an object type by name
    pub fn object(&self, name: &str) -> Option<&ObjectSchema> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Iterate all declared object types
    pub fn objects(&self) -> impl Iterator<Item = &ObjectSchema> {
        self.objects.iter()
    }

    /// Canonical persisted shape for migration comparison
    pub fn shape(&self) -> SchemaShape {
        self.objects
            .iter()
            .map(|o| {
                (
                    o.name.clone(),
                    o.persisted_properties()
                        .map(|p| (p.name.clone(), p.field_type))
                        .collect(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> ObjectSchema {
        ObjectSchema::new("Person")
            .with_property(PropertySchema::persisted("first_name", FieldType::String))
            .with_property(PropertySchema::persisted("last_name", FieldType::String))
            .with_property(PropertySchema::persisted("score", FieldType::Float))
            .with_property(PropertySchema::ignored("nickname", FieldType::String))
    }

    #[test]
    fn test_schema_version_sentinel() {
        assert_ne!(SchemaVersion::Unversioned, SchemaVersion::Version(0));
        assert_eq!(SchemaVersion::Version(3), SchemaVersion::Version(3));
        assert_eq!(SchemaVersion::Unversioned.to_string(), "unversioned");
        assert_eq!(SchemaVersion::Version(7).to_string(), "7");
    }

    #[test]
    fn test_property_lookup() {
        let schema = Schema::new(vec![person()]).unwrap();
        let obj = schema.object("Person").unwrap();
        assert_eq!(
            obj.property("score").map(|p| p.field_type),
            Some(FieldType::Float)
        );
        assert!(obj.property("missing").is_none());
        assert!(schema.object("Dog").is_none());
    }

    #[test]
    fn test_ignored_properties_excluded_from_shape() {
        let schema = Schema::new(vec![person()]).unwrap();
        let shape = schema.shape();
        let fields = shape.get("Person").unwrap();
        assert_eq!(fields.len(), 3);
        assert!(fields.iter().all(|(name, _)| name != "nickname"));
        // declaration order preserved
        assert_eq!(fields[0].0, "first_name");
        assert_eq!(fields[2].0, "score");
    }

    #[test]
    fn test_shape_equality_detects_changes() {
        let a = Schema::new(vec![person()]).unwrap();
        let b = Schema::new(vec![person()
            .with_property(PropertySchema::persisted("age", FieldType::Int))])
        .unwrap();
        assert_eq!(a.shape(), a.shape());
        assert_ne!(a.shape(), b.shape());

        // a changed ignored property does not change the shape
        let c = Schema::new(vec![ObjectSchema::new("Person")
            .with_property(PropertySchema::persisted("first_name", FieldType::String))
            .with_property(PropertySchema::persisted("last_name", FieldType::String))
            .with_property(PropertySchema::persisted("score", FieldType::Float))
            .with_property(PropertySchema::ignored("alias", FieldType::String))])
        .unwrap();
        assert_eq!(a.shape(), c.shape());
    }

    #[test]
    fn test_empty_names_rejected() {
        assert!(matches!(
            Schema::new(vec![ObjectSchema::new("")]),
            Err(Error::NullArgument("object type name"))
        ));
        let bad = ObjectSchema::new("Person")
            .with_property(PropertySchema::persisted("", FieldType::Int));
        assert!(matches!(
            Schema::new(vec![bad]),
            Err(Error::NullArgument("property name"))
        ));
    }

    #[test]
    fn test_duplicates_rejected() {
        let dup = ObjectSchema::new("Person")
            .with_property(PropertySchema::persisted("x", FieldType::Int))
            .with_property(PropertySchema::persisted("x", FieldType::Int));
        assert!(matches!(Schema::new(vec![dup]), Err(Error::InvalidSchema(_))));

        let dup_obj = Schema::new(vec![person(), person()]);
        assert!(matches!(dup_obj, Err(Error::InvalidSchema(_))));
    }

    #[test]
    fn test_computed_property_validation() {
        fn full_name(sources: &[FieldValue]) -> FieldValue {
            let first = sources[0].as_str().unwrap_or_default();
            let last = sources[1].as_str().unwrap_or_default();
            FieldValue::String(format!("{} {}", first, last))
        }

        let ok = person().with_computed(ComputedProperty {
            name: "full_name".to_string(),
            sources: vec!["first_name".to_string(), "last_name".to_string()],
            compose: full_name,
            decompose: None,
        });
        assert!(Schema::new(vec![ok]).is_ok());

        let bad_source = person().with_computed(ComputedProperty {
            name: "full_name".to_string(),
            sources: vec!["no_such".to_string()],
            compose: full_name,
            decompose: None,
        });
        assert!(matches!(
            Schema::new(vec![bad_source]),
            Err(Error::InvalidSchema(_))
        ));

        // computed may not map to an ignored property
        let ignored_source = person().with_computed(ComputedProperty {
            name: "aka".to_string(),
            sources: vec!["nickname".to_string()],
            compose: full_name,
            decompose: None,
        });
        assert!(matches!(
            Schema::new(vec![ignored_source]),
            Err(Error::InvalidSchema(_))
        ));
    }
}
