//! Record type: one row of a collection.

use crate::{error::Result, Error, RecordId, Schema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;

/// A data record: a stable identifier plus a JSON object payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique identifier for this record
    pub id: RecordId,
    /// Field values keyed by field name
    pub payload: Value,
}

impl Record {
    /// Create a new record.
    pub fn new(id: impl Into<RecordId>, payload: Value) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }

    /// Build a record from a payload, taking the identifier from the
    /// schema's id field. Numeric ids are rendered as strings.
    pub fn from_payload(schema: &Schema, payload: Value) -> Result<Self> {
        let id = match payload.get(&schema.id_field) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => {
                return Err(Error::InvalidPayload(format!(
                    "id field '{}' must be a string or number",
                    schema.id_field
                )))
            }
            None => return Err(Error::MissingRequiredField(schema.id_field.clone())),
        };
        Ok(Self::new(id, payload))
    }

    /// Get a raw payload value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.payload.get(field)
    }

    /// Field value as views see it: the schema's id field falls back to the
    /// record id when the payload does not carry it.
    pub fn field<'a>(&'a self, schema: &Schema, name: &str) -> Option<Cow<'a, Value>> {
        match self.payload.get(name) {
            Some(value) => Some(Cow::Borrowed(value)),
            None if name == schema.id_field => Some(Cow::Owned(Value::String(self.id.clone()))),
            None => None,
        }
    }

    /// Shallow-merge `patch` into the payload: each key in `patch`
    /// overwrites the same key here. The id is not touched.
    pub fn merge_patch(&mut self, patch: &Value) -> Result<()> {
        let patch = patch
            .as_object()
            .ok_or_else(|| Error::InvalidPayload("patch must be an object".into()))?;
        let target = self
            .payload
            .as_object_mut()
            .ok_or_else(|| Error::InvalidPayload("payload must be an object".into()))?;

        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}
