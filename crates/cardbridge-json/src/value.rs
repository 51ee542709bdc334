//! The restricted JSON value tree carried over the wire.
//!
//! Only the seven shapes the wire profile actually uses are
//! represented — there is no `serde::Value` style extensibility
//! here, and none is wanted: a tagged variant over a closed set keeps
//! every match in the parser and serializer exhaustive.

use std::fmt;

/// A parsed (or about-to-be-serialized) JSON value.
///
/// Numbers are `f32` throughout, matching the wire's single-precision
/// contract — small integer fields (indices, command codes) round
/// trip exactly; nothing on this wire needs more than 24 bits of
/// mantissa.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonValue {
    Null,
    Bool(bool),
    Number(f32),
    String(String),
    Array(Vec<JsonValue>),
    Object(Vec<(String, JsonValue)>),
}

impl JsonValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            JsonValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[JsonValue]> {
        match self {
            JsonValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, JsonValue)]> {
        match self {
            JsonValue::Object(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a key in an object. Duplicate keys are permitted by
    /// the parser; this returns the first match, matching the
    /// profile's documented lookup behavior.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.as_object()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JsonValue::Null)
    }
}

impl From<bool> for JsonValue {
    fn from(b: bool) -> Self {
        JsonValue::Bool(b)
    }
}

impl From<f32> for JsonValue {
    fn from(n: f32) -> Self {
        JsonValue::Number(n)
    }
}

impl From<&str> for JsonValue {
    fn from(s: &str) -> Self {
        JsonValue::String(s.to_owned())
    }
}

impl From<String> for JsonValue {
    fn from(s: String) -> Self {
        JsonValue::String(s)
    }
}

impl fmt::Display for JsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::serializer::to_string(self))
    }
}

/// A small builder for object values, used by the dispatcher when it
/// assembles a response or event body. Preserves insertion order.
#[derive(Debug, Default, Clone)]
pub struct ObjectBuilder {
    entries: Vec<(String, JsonValue)>,
}

impl ObjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.entries.push((key.to_owned(), value.into()));
        self
    }

    pub fn build(self) -> JsonValue {
        JsonValue::Object(self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_builder_preserves_order() {
        let v = ObjectBuilder::new()
            .field("i", "q1")
            .field("verNat", "0.3.1")
            .build();
        let entries = v.as_object().unwrap();
        assert_eq!(entries[0].0, "i");
        assert_eq!(entries[1].0, "verNat");
    }

    #[test]
    fn get_returns_first_duplicate() {
        let v = JsonValue::Object(vec![
            ("a".into(), JsonValue::Number(1.0)),
            ("a".into(), JsonValue::Number(2.0)),
        ]);
        assert_eq!(v.get("a").unwrap().as_f32(), Some(1.0));
    }
}
