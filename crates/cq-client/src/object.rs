//! # Object Mapping
//!
//! Turns result documents into typed objects. The executor creates an empty
//! instance with [`RemoteObject::materialize`] and fills it with
//! [`RemoteObject::apply`].

use serde_json::{Map, Value as JsonValue};

use crate::error::Error;

pub trait RemoteObject: Sized {
    /// An empty object of `class_name`.
    fn materialize(class_name: &str) -> Self;

    /// Merge a service document into `self`.
    fn apply(&mut self, document: &Map<String, JsonValue>) -> Result<(), Error>;
}

/// Untyped remote object: system fields split out, everything else kept as
/// raw JSON in response order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    class_name: String,
    object_id: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
    fields: Map<String, JsonValue>,
}

impl Object {
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn object_id(&self) -> Option<&str> {
        self.object_id.as_deref()
    }

    pub fn created_at(&self) -> Option<&str> {
        self.created_at.as_deref()
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, JsonValue> {
        &self.fields
    }
}

impl RemoteObject for Object {
    fn materialize(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_owned(),
            ..Default::default()
        }
    }

    fn apply(&mut self, document: &Map<String, JsonValue>) -> Result<(), Error> {
        for (key, value) in document {
            match key.as_str() {
                "objectId" => self.object_id = Some(system_string(key, value)?),
                "createdAt" => self.created_at = Some(system_string(key, value)?),
                "updatedAt" => self.updated_at = Some(system_string(key, value)?),
                "className" | "__type" => {}
                _ => {
                    self.fields.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }
}

fn system_string(key: &str, value: &JsonValue) -> Result<String, Error> {
    value
        .as_str()
        .map(ToOwned::to_owned)
        .ok_or_else(|| Error::Mapping(format!("`{}` must be a string, got {}", key, value)))
}
