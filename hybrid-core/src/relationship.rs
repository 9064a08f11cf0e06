//! Object relationships

use crate::item::{AttributeValue, Id};
use crate::metadata::RelationshipType;
use serde::{Deserialize, Serialize};

/// One parent-to-child link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRow {
    pub id: String,
    pub child_id: Option<Id>,
    pub attributes: Vec<AttributeValue>,
    /// Set for attachment rows.
    pub file_id: String,
    pub file_name: String,
}

/// All relationships of one type owned by an object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipTable {
    pub id: Id,
    pub relationship_type: RelationshipType,
    /// Change that carries BOM redlines, when the table represents them.
    pub red_line_change: Option<Id>,
    pub rows: Vec<RelationshipRow>,
}
