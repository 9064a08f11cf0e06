//! Item, identifier and value types

use crate::metadata::{Type, TypeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Object identifier in the external system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Id {
    /// Human-facing identifier (part number, change number).
    pub public_id: String,
    /// Internal identifier, when the system distinguishes one.
    pub private_id: String,
    pub type_id: Option<TypeId>,
}

impl Id {
    pub fn new(public_id: impl Into<String>) -> Self {
        Self {
            public_id: public_id.into(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, type_id: TypeId) -> Self {
        self.type_id = Some(type_id);
        self
    }

    /// Key used to address the object; prefers the private id when present.
    pub fn key(&self) -> &str {
        if self.private_id.is_empty() {
            &self.public_id
        } else {
            &self.private_id
        }
    }
}

// ============================================================================
// VALUES
// ============================================================================

/// Unit-of-measure value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UomValue {
    pub unit_name: String,
    pub unit_value: f64,
}

/// Entry of a predefined attribute value list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListValue {
    pub id: String,
    pub value: Box<Value>,
}

/// Typed attribute value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    #[default]
    None,
    String(String),
    Bool(bool),
    Double(f64),
    Float(f32),
    Int(i32),
    /// Unix timestamp in milliseconds.
    Date(i64),
    Reference(Id),
    Uom(UomValue),
    List(ListValue),
}

impl Value {
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Textual rendering used for attribute matching in queries.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::None => None,
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Double(d) => Some(d.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Date(ts) => Some(ts.to_string()),
            Value::Reference(id) => Some(id.public_id.clone()),
            Value::Uom(uom) => Some(format!("{} {}", uom.unit_value, uom.unit_name)),
            Value::List(list) => list.value.as_text(),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

/// Attribute id paired with its value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub attribute_id: String,
    pub value: Value,
}

impl AttributeValue {
    pub fn new(attribute_id: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            attribute_id: attribute_id.into(),
            value: value.into(),
        }
    }
}

// ============================================================================
// ITEMS
// ============================================================================

/// Object materialized in the external system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub id: Id,
    pub values: Vec<AttributeValue>,
    /// Deep link to the object in the PLM user interface.
    pub link: String,
}

impl Item {
    pub fn value_of(&self, attribute_id: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|v| v.attribute_id == attribute_id)
            .map(|v| &v.value)
    }

    /// Replaces values with matching attribute ids and appends the rest.
    pub fn apply_values(&mut self, values: &[AttributeValue]) {
        for update in values {
            match self
                .values
                .iter_mut()
                .find(|v| v.attribute_id == update.attribute_id)
            {
                Some(existing) => existing.value = update.value.clone(),
                None => self.values.push(update.clone()),
            }
        }
    }
}

/// Numbering scheme used when the system assigns ids on creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingFormat {
    pub id: String,
    pub type_id: Option<TypeId>,
    pub fields: HashMap<String, String>,
}

/// Specification of an object to create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemCreateSpec {
    pub autonumber: Option<NumberingFormat>,
    pub metadata: Option<Type>,
    pub values: Vec<AttributeValue>,
    /// Requested identifier; generated when absent.
    pub specific_id: Option<Id>,
}

/// Specification of an update to an existing object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemUpdateSpec {
    pub id: Id,
    pub values: Vec<AttributeValue>,
    pub metadata: Option<Type>,
}

/// Outcome for one entry of a create or update batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemResult {
    Item(Item),
    Error(String),
}

impl ItemResult {
    pub fn error(message: impl Into<String>) -> Self {
        ItemResult::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ItemResult::Error(_))
    }
}

/// File content uploaded to the external system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResource {
    pub file_name: String,
    pub data: Vec<u8>,
}
