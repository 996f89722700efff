//! Per-request decoded field values.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use jiff::Timestamp;
use jiff::civil::Date;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A decoded field value.
#[derive(Clone)]
pub enum FieldValue {
    /// Raw or number-coerced JSON.
    Json(Value),
    Timestamp(Timestamp),
    Date(Date),
    /// Output of a user-defined [`Format`](crate::format::Format).
    Custom(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Json(v) => f.debug_tuple("Json").field(v).finish(),
            FieldValue::Timestamp(t) => f.debug_tuple("Timestamp").field(t).finish(),
            FieldValue::Date(d) => f.debug_tuple("Date").field(d).finish(),
            FieldValue::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Values bound from one request, keyed by field name.
///
/// Fields absent from the request have no entry.
#[derive(Debug, Clone, Default)]
pub struct Values {
    fields: HashMap<String, FieldValue>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn json(&self, name: &str) -> Option<&Value> {
        match self.get(name)? {
            FieldValue::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.json(name)?.as_str()
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.json(name)?.as_f64()
    }

    pub fn i64(&self, name: &str) -> Option<i64> {
        self.json(name)?.as_i64()
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.json(name)?.as_bool()
    }

    pub fn timestamp(&self, name: &str) -> Option<Timestamp> {
        match self.get(name)? {
            FieldValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn date(&self, name: &str) -> Option<Date> {
        match self.get(name)? {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// A value produced by a custom format.
    pub fn custom<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        match self.get(name)? {
            FieldValue::Custom(v) => v.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    /// Deserialize a JSON value into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self, name: &str) -> crate::Result<Option<T>> {
        match self.json(name) {
            Some(v) => Ok(Some(serde_json::from_value(v.clone())?)),
            None => Ok(None),
        }
    }
}
