//! Stored records

use autoscope_core::{Map, Value};
use serde::{Deserialize, Serialize};

/// Pseudo-field addressing a record's identifier.
pub const ID_FIELD: &str = "id";
/// Pseudo-field addressing a record's concrete type.
pub const TYPE_FIELD: &str = "type";

/// One row of a table. `type_name` is the concrete model of the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// 0 until the record is inserted
    pub id: u64,
    #[serde(rename = "type")]
    pub type_name: String,
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            id: 0,
            type_name: type_name.into(),
            fields: Map::new(),
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Field value; `id` and `type` address the record header. Missing
    /// fields read as `null`.
    pub fn field(&self, name: &str) -> Value {
        match name {
            ID_FIELD => Value::from(self.id),
            TYPE_FIELD => Value::String(self.type_name.clone()),
            _ => self.fields.get(name).cloned().unwrap_or(Value::Null),
        }
    }
}
