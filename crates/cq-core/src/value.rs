//! # Wire Values
//!
//! Typed operands carried by constraints, and their encoding into the JSON
//! wire format the service parses. Encoding is deferred until a query is
//! compiled, so an operand that cannot be represented surfaces as an
//! [`EncodeError`] from `compile()` rather than at constraint time.

use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::{json, Map, Number, Value as JsonValue};

use crate::error::EncodeError;

/// Ordered field map. Also the shape of a compiled constraint document.
pub type Document = IndexMap<String, Value>;

// =============================================================================
// Value
// =============================================================================

/// A remote-service-encodable datum.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Array(Vec<Value>),
    Object(Document),
    Date(DateTime<Utc>),
    GeoPoint(GeoPoint),
    Pointer(ObjectRef),
    Bytes(Vec<u8>),
}

impl Value {
    /// Wrap raw bytes. `Vec<u8>` would otherwise convert as an array of numbers.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(data.into())
    }

    /// Encode into the wire format, recursing through arrays and objects.
    pub fn encode(&self) -> Result<JsonValue, EncodeError> {
        let encoded = match self {
            Self::Null => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Integer(n) => JsonValue::Number((*n).into()),
            Self::Double(n) => Number::from_f64(*n)
                .map(JsonValue::Number)
                .ok_or(EncodeError::NonFiniteNumber(*n))?,
            Self::String(s) => JsonValue::String(s.clone()),
            Self::Array(items) => JsonValue::Array(
                items
                    .iter()
                    .map(Value::encode)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Self::Object(fields) => JsonValue::Object(encode_document(fields)?),
            Self::Date(at) => json!({
                "__type": "Date",
                "iso": at.to_rfc3339_opts(SecondsFormat::Millis, true),
            }),
            Self::GeoPoint(point) => point.encode()?,
            Self::Pointer(reference) => reference.encode()?,
            Self::Bytes(data) => json!({
                "__type": "Bytes",
                "base64": base64::engine::general_purpose::STANDARD.encode(data),
            }),
        };
        Ok(encoded)
    }
}

/// Encode every entry of a document, keeping key order.
pub fn encode_document(document: &Document) -> Result<Map<String, JsonValue>, EncodeError> {
    let mut map = Map::with_capacity(document.len());
    for (key, value) in document {
        map.insert(key.clone(), value.encode()?);
    }
    Ok(map)
}

// =============================================================================
// Geographic point
// =============================================================================

/// A point on the sphere, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    fn encode(&self) -> Result<JsonValue, EncodeError> {
        let in_range = (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude);
        if !in_range {
            return Err(EncodeError::InvalidGeoPoint {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }
        Ok(json!({
            "__type": "GeoPoint",
            "latitude": self.latitude,
            "longitude": self.longitude,
        }))
    }
}

// =============================================================================
// Object reference
// =============================================================================

/// A reference to a remote object. Objects that were never saved have no id
/// and cannot be encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub class_name: String,
    pub object_id: Option<String>,
}

impl ObjectRef {
    pub fn new(class_name: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            object_id: Some(object_id.into()),
        }
    }

    pub fn unsaved(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            object_id: None,
        }
    }

    fn encode(&self) -> Result<JsonValue, EncodeError> {
        let object_id = self
            .object_id
            .as_deref()
            .ok_or_else(|| EncodeError::UnsavedObject(self.class_name.clone()))?;
        Ok(json!({
            "__type": "Pointer",
            "className": self.class_name,
            "objectId": object_id,
        }))
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Integer(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(at: DateTime<Utc>) -> Self {
        Self::Date(at)
    }
}

impl From<GeoPoint> for Value {
    fn from(point: GeoPoint) -> Self {
        Self::GeoPoint(point)
    }
}

impl From<ObjectRef> for Value {
    fn from(reference: ObjectRef) -> Self {
        Self::Pointer(reference)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        Self::Object(document)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}
