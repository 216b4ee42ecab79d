//! # Value Type System
//!
//! Core scalar and tuple types for the query evaluator, supporting
//! arbitrary arity tuples with dynamically-typed fields.
//!
//! ## Design Decisions
//!
//! - **Four scalar types**: integers, floats, strings, and booleans —
//!   the types the dataset model uses. There is no NULL value; absent
//!   data is not representable and aggregates over empty groups are
//!   reported as errors instead.
//! - **Bit-exact float equality**: `PartialEq`/`Hash` compare `f64` by
//!   bits so values can serve as hash-join and grouping keys.
//! - **Fallible ordering**: cross-type comparison (other than the
//!   numeric `Int64`/`Float64` pair) is a [`QueryError::TypeMismatch`],
//!   not a silent total order. Filters, sorting, and `min`/`max` all go
//!   through [`Value::try_cmp`].

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{QueryError, QueryResult};

/// Supported data types for tuple fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int64,
    Float64,
    String,
    Bool,
}

impl DataType {
    /// True for types that participate in numeric comparison and arithmetic
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int64 | DataType::Float64)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int64 => write!(f, "int"),
            DataType::Float64 => write!(f, "float"),
            DataType::String => write!(f, "string"),
            DataType::Bool => write!(f, "bool"),
        }
    }
}

/// A dynamically-typed value stored in a tuple field
#[derive(Debug, Clone)]
pub enum Value {
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
    /// UTF-8 string (reference counted for efficient cloning)
    String(Arc<str>),
    /// Boolean value
    Bool(bool),
}

impl Value {
    /// Get the data type of this value
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int64(_) => DataType::Int64,
            Value::Float64(_) => DataType::Float64,
            Value::String(_) => DataType::String,
            Value::Bool(_) => DataType::Bool,
        }
    }

    /// Try to get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as f64, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            Value::Int64(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Try to get as string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Create a string value from a &str
    pub fn string(s: &str) -> Self {
        Value::String(Arc::from(s))
    }

    /// Compare two values using natural scalar ordering.
    ///
    /// `Int64` and `Float64` compare numerically against each other;
    /// any other cross-type pair is a `TypeMismatch`.
    pub fn try_cmp(&self, other: &Value) -> QueryResult<Ordering> {
        match (self, other) {
            (Value::Int64(a), Value::Int64(b)) => Ok(a.cmp(b)),
            (Value::Float64(a), Value::Float64(b)) => {
                Ok(a.partial_cmp(b).unwrap_or(Ordering::Equal))
            }
            (Value::Int64(a), Value::Float64(b)) => {
                Ok((*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal))
            }
            (Value::Float64(a), Value::Int64(b)) => {
                Ok(a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal))
            }
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (a, b) => Err(QueryError::TypeMismatch {
                operation: "compare",
                left: a.data_type(),
                right: b.data_type(),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

// Implement PartialEq manually to handle f64 comparison
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

// Implement Hash manually to handle f64
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Int64(v) => v.hash(state),
            Value::Float64(v) => v.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::Bool(b) => b.hash(state),
        }
    }
}

// Convenience conversions
impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s.as_str()))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

// Tagged representation: {"type": "Int64", "value": 42}
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            Value::Int64(v) => {
                map.serialize_entry("type", "Int64")?;
                map.serialize_entry("value", v)?;
            }
            Value::Float64(v) => {
                map.serialize_entry("type", "Float64")?;
                map.serialize_entry("value", v)?;
            }
            Value::String(s) => {
                map.serialize_entry("type", "String")?;
                map.serialize_entry("value", s.as_ref())?;
            }
            Value::Bool(b) => {
                map.serialize_entry("type", "Bool")?;
                map.serialize_entry("value", b)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a Value object with type and value fields")
            }

            fn visit_map<M>(self, mut map: M) -> Result<Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut type_str: Option<String> = None;
                let mut raw_value: Option<serde_json::Value> = None;

                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "type" => type_str = Some(map.next_value()?),
                        "value" => raw_value = Some(map.next_value()?),
                        _ => {
                            let _: serde_json::Value = map.next_value()?;
                        }
                    }
                }

                let type_str = type_str.ok_or_else(|| serde::de::Error::missing_field("type"))?;
                let raw_value =
                    raw_value.ok_or_else(|| serde::de::Error::missing_field("value"))?;

                match type_str.as_str() {
                    "Int64" => {
                        let v: i64 =
                            serde_json::from_value(raw_value).map_err(serde::de::Error::custom)?;
                        Ok(Value::Int64(v))
                    }
                    "Float64" => {
                        let v: f64 =
                            serde_json::from_value(raw_value).map_err(serde::de::Error::custom)?;
                        Ok(Value::Float64(v))
                    }
                    "String" => {
                        let v: String =
                            serde_json::from_value(raw_value).map_err(serde::de::Error::custom)?;
                        Ok(Value::String(Arc::from(v.as_str())))
                    }
                    "Bool" => {
                        let v: bool =
                            serde_json::from_value(raw_value).map_err(serde::de::Error::custom)?;
                        Ok(Value::Bool(v))
                    }
                    _ => Err(serde::de::Error::unknown_variant(
                        &type_str,
                        &["Int64", "Float64", "String", "Bool"],
                    )),
                }
            }
        }

        deserializer.deserialize_map(ValueVisitor)
    }
}

/// A tuple with arbitrary arity containing Values
///
/// Immutable once produced: pipeline stages build new tuples rather than
/// mutating rows in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tuple {
    values: Vec<Value>,
}

impl Tuple {
    /// Create a new tuple from a vector of values
    pub fn new(values: Vec<Value>) -> Self {
        Tuple { values }
    }

    /// Create an empty tuple
    pub fn empty() -> Self {
        Tuple { values: Vec::new() }
    }

    /// Get the number of fields in this tuple
    pub fn arity(&self) -> usize {
        self.values.len()
    }

    /// Get a value by index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get all values as a slice
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Convert to owned values
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Create a new tuple by selecting specific fields
    pub fn project(&self, indices: &[usize]) -> Self {
        let values = indices
            .iter()
            .filter_map(|&i| self.values.get(i).cloned())
            .collect();
        Tuple { values }
    }

    /// Concatenate two tuples
    pub fn concat(&self, other: &Tuple) -> Self {
        let mut values = self.values.clone();
        values.extend(other.values.iter().cloned());
        Tuple { values }
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, ")")
    }
}

impl<'a> IntoIterator for &'a Tuple {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl IntoIterator for Tuple {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
