//! Field value types for Lodestone
//!
//! This module defines:
//! - `FieldType`: the declared storage type of a schema property
//! - `FieldValue`: the value stored in a record field
//!
//! ## Numeric width is part of the type
//!
//! Single- and double-precision floats are distinct types and distinct value
//! variants. A value written as `Float(42.42)` compares equal only to another
//! `Float` holding exactly `42.42f32`, never to a `Double` that merely
//! approximates it. This exactness is what the query engine's equality
//! operators are built on.
//!
//! ## Type equality
//!
//! Different variants are never equal, even when they contain the same
//! numeric quantity: `Int(1) != Double(1.0)`. Float equality within a
//! variant follows IEEE-754: `NaN != NaN`, `-0.0 == 0.0`.

use serde::{Deserialize, Serialize};

/// Declared storage type of a schema property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Boolean
    Bool,
    /// 64-bit signed integer
    Int,
    /// 32-bit floating point (single precision)
    Float,
    /// 64-bit floating point (double precision)
    Double,
    /// UTF-8 string
    String,
}

impl FieldType {
    /// Get the type name as a string
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Bool => "Bool",
            FieldType::Int => "Int",
            FieldType::Float => "Float",
            FieldType::Double => "Double",
            FieldType::String => "String",
        }
    }

    /// Default value for a freshly created record field of this type
    pub fn default_value(&self) -> FieldValue {
        match self {
            FieldType::Bool => FieldValue::Bool(false),
            FieldType::Int => FieldValue::Int(0),
            FieldType::Float => FieldValue::Float(0.0),
            FieldType::Double => FieldValue::Double(0.0),
            FieldType::String => FieldValue::String(String::new()),
        }
    }
}

/// Value stored in a record field
///
/// `Null` marks a field that has never been written on an unmanaged object;
/// persisted record fields always hold a typed value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FieldValue {
    /// Absent value (unmanaged objects only)
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 32-bit floating point, stored at single precision
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// UTF-8 string
    String(String),
}

// Custom PartialEq: exact per-variant comparison, IEEE-754 within floats.
impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => true,
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a == b,
            (FieldValue::Int(a), FieldValue::Int(b)) => a == b,
            (FieldValue::Float(a), FieldValue::Float(b)) => a == b,
            (FieldValue::Double(a), FieldValue::Double(b)) => a == b,
            (FieldValue::String(a), FieldValue::String(b)) => a == b,
            // Different variants are never equal
            _ => false,
        }
    }
}

impl FieldValue {
    /// Get the variant name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "Null",
            FieldValue::Bool(_) => "Bool",
            FieldValue::Int(_) => "Int",
            FieldValue::Float(_) => "Float",
            FieldValue::Double(_) => "Double",
            FieldValue::String(_) => "String",
        }
    }

    /// Declared type this value satisfies, or None for `Null`
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            FieldValue::Null => None,
            FieldValue::Bool(_) => Some(FieldType::Bool),
            FieldValue::Int(_) => Some(FieldType::Int),
            FieldValue::Float(_) => Some(FieldType::Float),
            FieldValue::Double(_) => Some(FieldType::Double),
            FieldValue::String(_) => Some(FieldType::String),
        }
    }

    /// Check if this is the null value
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f32 if this is a single-precision Float value
    pub fn as_float(&self) -> Option<f32> {
        match self {
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as f64 if this is a Double value
    pub fn as_double(&self) -> Option<f64> {
        match self {
            FieldValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view for ordering comparisons
    ///
    /// Widens Int/Float/Double to f64. Equality must NOT be built on this
    /// (width is significant for equality); ordering may.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(f64::from(*f)),
            FieldValue::Double(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Double(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}
