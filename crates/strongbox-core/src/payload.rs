//! Event payloads: insertion-ordered mappings of field name to scalar.
//!
//! A payload is the only serialization contract between an event and the
//! outside world. Events export themselves with `to_payload` and are rebuilt
//! with `from_payload`; no wire format is implied beyond the serde impls.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// A scalar payload field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    /// No value.
    Null,
    /// A boolean flag.
    Boolean(bool),
    /// A signed integer.
    Integer(i64),
    /// A string.
    Text(String),
}

impl PayloadValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Text(_) => "text",
        }
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for PayloadValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for PayloadValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Ordered mapping of field name to scalar value.
///
/// Iteration yields fields in insertion order. Inserting an existing key
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPayload {
    fields: Vec<(String, PayloadValue)>,
}

impl EventPayload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts or replaces a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PayloadValue>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the payload has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PayloadValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns a reader that reports missing or mistyped fields as
    /// `DomainError::InvalidPayload` for `event_type`.
    #[must_use]
    pub fn reader<'a>(&'a self, event_type: &'a str) -> PayloadReader<'a> {
        PayloadReader {
            event_type,
            payload: self,
        }
    }
}

impl<K, V> FromIterator<(K, V)> for EventPayload
where
    K: Into<String>,
    V: Into<PayloadValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = Self::new();
        for (k, v) in iter {
            payload.insert(k, v);
        }
        payload
    }
}

impl Serialize for EventPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for EventPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PayloadVisitor;

        impl<'de> Visitor<'de> for PayloadVisitor {
            type Value = EventPayload;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut payload = EventPayload::new();
                while let Some((key, value)) = access.next_entry::<String, PayloadValue>()? {
                    payload.insert(key, value);
                }
                Ok(payload)
            }
        }

        deserializer.deserialize_map(PayloadVisitor)
    }
}

/// Typed field access over an [`EventPayload`].
#[derive(Debug, Clone, Copy)]
pub struct PayloadReader<'a> {
    event_type: &'a str,
    payload: &'a EventPayload,
}

impl<'a> PayloadReader<'a> {
    fn require(&self, key: &str) -> Result<&'a PayloadValue, DomainError> {
        self.payload
            .get(key)
            .ok_or_else(|| DomainError::invalid_payload(self.event_type, format!("missing field `{key}`")))
    }

    fn mistyped(&self, key: &str, expected: &str, found: &PayloadValue) -> DomainError {
        DomainError::invalid_payload(
            self.event_type,
            format!("field `{key}` must be {expected}, found {}", found.kind()),
        )
    }

    /// Reads a required text field.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPayload` if the field is missing or not text.
    pub fn text(&self, key: &str) -> Result<&'a str, DomainError> {
        match self.require(key)? {
            PayloadValue::Text(value) => Ok(value),
            other => Err(self.mistyped(key, "text", other)),
        }
    }

    /// Reads a required integer field.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPayload` if the field is missing or not an integer.
    pub fn integer(&self, key: &str) -> Result<i64, DomainError> {
        match self.require(key)? {
            PayloadValue::Integer(value) => Ok(*value),
            other => Err(self.mistyped(key, "integer", other)),
        }
    }

    /// Reads a required boolean field.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPayload` if the field is missing or not a boolean.
    pub fn boolean(&self, key: &str) -> Result<bool, DomainError> {
        match self.require(key)? {
            PayloadValue::Boolean(value) => Ok(*value),
            other => Err(self.mistyped(key, "boolean", other)),
        }
    }
}
