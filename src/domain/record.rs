//! Opaque key/value payload handed from a producer to its observers.

use crate::domain::errors::RecordError;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// One unit of produced data.
///
/// The payload is shared behind an `Arc`, so cloning a record for every
/// observer never copies the map, and nobody can mutate it once built.
#[derive(Clone, PartialEq)]
pub struct DataRecord {
    fields: Arc<Map<String, Value>>,
}

impl DataRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields: Arc::new(fields),
        }
    }

    /// Build a record from any value that serializes to a JSON object.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, RecordError> {
        Self::try_from(serde_json::to_value(value)?)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.as_ref().clone())
    }

    /// True when both records share the same payload allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.fields, &other.fields)
    }
}

impl TryFrom<Value> for DataRecord {
    type Error = RecordError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self::new(map)),
            Value::Null => Err(RecordError::NotAnObject { kind: "null" }),
            Value::Bool(_) => Err(RecordError::NotAnObject { kind: "bool" }),
            Value::Number(_) => Err(RecordError::NotAnObject { kind: "number" }),
            Value::String(_) => Err(RecordError::NotAnObject { kind: "string" }),
            Value::Array(_) => Err(RecordError::NotAnObject { kind: "array" }),
        }
    }
}

impl From<Map<String, Value>> for DataRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

impl Serialize for DataRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.as_ref().serialize(serializer)
    }
}

impl fmt::Debug for DataRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.fields.iter()).finish()
    }
}

impl fmt::Display for DataRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self.fields.as_ref()) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(fmt::Error),
        }
    }
}
