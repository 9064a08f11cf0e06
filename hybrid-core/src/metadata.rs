//! Type metadata of the external system

use crate::item::ListValue;
use serde::{Deserialize, Serialize};

/// Base object category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseType {
    #[default]
    Item,
    Change,
}

/// Identifier of an object type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeId {
    pub id: String,
    pub name: String,
    pub api_name: String,
    pub base_type: BaseType,
}

impl TypeId {
    pub fn new(id: impl Into<String>, base_type: BaseType) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            api_name: id.clone(),
            id,
            base_type,
        }
    }

    /// Whether `qualifier` names this type by id, name or API name.
    pub fn matches(&self, qualifier: &str) -> bool {
        self.id == qualifier || self.name == qualifier || self.api_name == qualifier
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Datatype {
    #[default]
    Text,
    Number,
    Date,
    Uom,
    Object,
    Boolean,
}

/// Restriction on the values an attribute accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Valueset {
    /// Any value.
    #[default]
    Free,
    /// Only values from `list_values`.
    List,
    /// Any value, with `list_values` offered as suggestions.
    Hybrid,
}

/// Attribute definition on an object type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeSpec {
    pub id: String,
    pub api_name: String,
    pub name: String,
    pub category: String,
    pub multi_valued: bool,
    pub read_only: bool,
    /// Must be set when the object is created.
    pub required: bool,
    pub built_in: bool,
    pub uom_family_name: String,
    pub data_type: Datatype,
    pub valueset_type: Valueset,
    pub list_values: Vec<ListValue>,
}

impl AttributeSpec {
    /// Attribute id, falling back to the API name when no id is set.
    pub fn effective_id(&self) -> &str {
        if self.id.is_empty() {
            &self.api_name
        } else {
            &self.id
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    #[default]
    Bom,
    Attachments,
    ManufacturerParts,
    AffectedItems,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipSpec {
    pub relationship_type: RelationshipType,
    pub attributes: Vec<AttributeSpec>,
}

/// Full definition of an object type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Type {
    pub id: TypeId,
    pub attributes: Vec<AttributeSpec>,
    pub relationships: Vec<RelationshipSpec>,
}
