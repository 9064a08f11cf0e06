//! Conversions between wire messages and the domain model.
//!
//! Missing optional messages become domain defaults. Enumeration fields go
//! through the prost getters, so unknown values decode to the zero variant.

use crate::custom;
use hybrid_core as domain;

macro_rules! enum_bridge {
    ($wire:ty, $domain:ty, [$($variant:ident),+ $(,)?]) => {
        impl From<$wire> for $domain {
            fn from(value: $wire) -> Self {
                type W = $wire;
                type D = $domain;
                match value {
                    $(W::$variant => D::$variant,)+
                }
            }
        }

        impl From<$domain> for $wire {
            fn from(value: $domain) -> Self {
                type W = $wire;
                type D = $domain;
                match value {
                    $(D::$variant => W::$variant,)+
                }
            }
        }
    };
}

enum_bridge!(custom::BaseType, domain::BaseType, [Item, Change]);
enum_bridge!(
    custom::RelationshipType,
    domain::RelationshipType,
    [Bom, Attachments, ManufacturerParts, AffectedItems]
);
enum_bridge!(
    custom::attribute_spec::Datatype,
    domain::Datatype,
    [Text, Number, Date, Uom, Object, Boolean]
);
enum_bridge!(custom::attribute_spec::Valueset, domain::Valueset, [Free, List, Hybrid]);
enum_bridge!(custom::query_attribute::Occurrence, domain::Occurrence, [Should, Must]);
enum_bridge!(
    custom::SupportedOperation,
    domain::SupportedOperation,
    [
        CreateChangeOrder,
        ExtractPartChoicesFromAttributes,
        IncrementalPartChoicesSync,
        AdvanceChangeOrder,
        CreateInfoNumbering,
        PublishWithNoBomSectionInConfig,
        CreateMfrParts,
    ]
);

fn convert_all<T, U: From<T>>(values: Vec<T>) -> Vec<U> {
    values.into_iter().map(U::from).collect()
}

// ============================================================================
// AUTH
// ============================================================================

impl From<custom::Credentials> for domain::Credentials {
    fn from(value: custom::Credentials) -> Self {
        Self {
            username: value.username,
            password: value.password,
        }
    }
}

impl From<custom::Auth> for domain::Auth {
    fn from(value: custom::Auth) -> Self {
        Self {
            plm_url: value.plm_url,
            auth_token: value.auth_token,
            credentials: value.credentials.map(Into::into),
            licenses: value.licenses,
            context: value.context,
        }
    }
}

// ============================================================================
// IDENTIFIERS AND VALUES
// ============================================================================

impl From<custom::TypeId> for domain::TypeId {
    fn from(value: custom::TypeId) -> Self {
        Self {
            base_type: value.base_type().into(),
            id: value.id,
            name: value.name,
            api_name: value.api_name,
        }
    }
}

impl From<domain::TypeId> for custom::TypeId {
    fn from(value: domain::TypeId) -> Self {
        Self {
            base_type: custom::BaseType::from(value.base_type) as i32,
            id: value.id,
            name: value.name,
            api_name: value.api_name,
        }
    }
}

impl From<custom::Id> for domain::Id {
    fn from(value: custom::Id) -> Self {
        Self {
            public_id: value.public_id,
            private_id: value.private_id,
            type_id: value.type_id.map(Into::into),
        }
    }
}

impl From<domain::Id> for custom::Id {
    fn from(value: domain::Id) -> Self {
        Self {
            public_id: value.public_id,
            private_id: value.private_id,
            type_id: value.type_id.map(Into::into),
        }
    }
}

impl From<custom::UomValue> for domain::UomValue {
    fn from(value: custom::UomValue) -> Self {
        Self {
            unit_name: value.unit_name,
            unit_value: value.unit_value,
        }
    }
}

impl From<domain::UomValue> for custom::UomValue {
    fn from(value: domain::UomValue) -> Self {
        Self {
            unit_name: value.unit_name,
            unit_value: value.unit_value,
        }
    }
}

impl From<custom::ListValue> for domain::ListValue {
    fn from(value: custom::ListValue) -> Self {
        Self {
            id: value.id,
            value: Box::new(value.value.map(|v| (*v).into()).unwrap_or_default()),
        }
    }
}

impl From<domain::ListValue> for custom::ListValue {
    fn from(value: domain::ListValue) -> Self {
        Self {
            id: value.id,
            value: Some(Box::new((*value.value).into())),
        }
    }
}

impl From<custom::Value> for domain::Value {
    fn from(value: custom::Value) -> Self {
        use custom::value::TypedValue;

        match value.typed_value {
            None => domain::Value::None,
            Some(TypedValue::StringValue(s)) => domain::Value::String(s),
            Some(TypedValue::BoolValue(b)) => domain::Value::Bool(b),
            Some(TypedValue::DoubleValue(d)) => domain::Value::Double(d),
            Some(TypedValue::FloatValue(f)) => domain::Value::Float(f),
            Some(TypedValue::IntValue(i)) => domain::Value::Int(i),
            Some(TypedValue::DateValue(ts)) => domain::Value::Date(ts),
            Some(TypedValue::ReferenceValue(id)) => domain::Value::Reference(id.into()),
            Some(TypedValue::UomValue(uom)) => domain::Value::Uom(uom.into()),
            Some(TypedValue::ListValue(list)) => domain::Value::List((*list).into()),
        }
    }
}

impl From<domain::Value> for custom::Value {
    fn from(value: domain::Value) -> Self {
        use custom::value::TypedValue;

        let typed_value = match value {
            domain::Value::None => None,
            domain::Value::String(s) => Some(TypedValue::StringValue(s)),
            domain::Value::Bool(b) => Some(TypedValue::BoolValue(b)),
            domain::Value::Double(d) => Some(TypedValue::DoubleValue(d)),
            domain::Value::Float(f) => Some(TypedValue::FloatValue(f)),
            domain::Value::Int(i) => Some(TypedValue::IntValue(i)),
            domain::Value::Date(ts) => Some(TypedValue::DateValue(ts)),
            domain::Value::Reference(id) => Some(TypedValue::ReferenceValue(id.into())),
            domain::Value::Uom(uom) => Some(TypedValue::UomValue(uom.into())),
            domain::Value::List(list) => Some(TypedValue::ListValue(Box::new(list.into()))),
        };
        Self { typed_value }
    }
}

impl From<custom::AttributeValue> for domain::AttributeValue {
    fn from(value: custom::AttributeValue) -> Self {
        Self {
            attribute_id: value.attribute_id,
            value: value.value.map(Into::into).unwrap_or_default(),
        }
    }
}

impl From<domain::AttributeValue> for custom::AttributeValue {
    fn from(value: domain::AttributeValue) -> Self {
        Self {
            attribute_id: value.attribute_id,
            value: Some(value.value.into()),
        }
    }
}

// ============================================================================
// ITEMS
// ============================================================================

impl From<custom::Item> for domain::Item {
    fn from(value: custom::Item) -> Self {
        Self {
            id: value.id.map(Into::into).unwrap_or_default(),
            values: convert_all(value.values),
            link: value.link,
        }
    }
}

impl From<domain::Item> for custom::Item {
    fn from(value: domain::Item) -> Self {
        Self {
            id: Some(value.id.into()),
            values: convert_all(value.values),
            link: value.link,
        }
    }
}

impl From<domain::ItemResult> for custom::ItemResult {
    fn from(value: domain::ItemResult) -> Self {
        use custom::item_result::Outcome;

        let outcome = match value {
            domain::ItemResult::Item(item) => Outcome::Item(item.into()),
            domain::ItemResult::Error(message) => Outcome::Error(custom::Error { message }),
        };
        Self {
            outcome: Some(outcome),
        }
    }
}

impl From<custom::NumberingFormat> for domain::NumberingFormat {
    fn from(value: custom::NumberingFormat) -> Self {
        Self {
            id: value.id,
            type_id: value.type_id.map(Into::into),
            fields: value.fields,
        }
    }
}

impl From<custom::ItemCreateSpec> for domain::ItemCreateSpec {
    fn from(value: custom::ItemCreateSpec) -> Self {
        Self {
            autonumber: value.autonumber.map(Into::into),
            metadata: value.metadata.map(Into::into),
            values: convert_all(value.values),
            specific_id: value.specific_id.map(Into::into),
        }
    }
}

impl From<custom::ItemUpdateSpec> for domain::ItemUpdateSpec {
    fn from(value: custom::ItemUpdateSpec) -> Self {
        Self {
            id: value.id.map(Into::into).unwrap_or_default(),
            values: convert_all(value.values),
            metadata: value.metadata.map(Into::into),
        }
    }
}

impl From<custom::FileResource> for domain::FileResource {
    fn from(value: custom::FileResource) -> Self {
        Self {
            file_name: value.file_name,
            data: value.data,
        }
    }
}

// ============================================================================
// METADATA
// ============================================================================

impl From<custom::AttributeSpec> for domain::AttributeSpec {
    fn from(value: custom::AttributeSpec) -> Self {
        Self {
            data_type: value.data_type().into(),
            valueset_type: value.valueset_type().into(),
            id: value.id,
            api_name: value.api_name,
            name: value.name,
            category: value.category,
            multi_valued: value.multi_valued,
            read_only: value.read_only,
            required: value.required,
            built_in: value.built_in,
            uom_family_name: value.uom_family_name,
            list_values: convert_all(value.list_values),
        }
    }
}

impl From<domain::AttributeSpec> for custom::AttributeSpec {
    fn from(value: domain::AttributeSpec) -> Self {
        Self {
            data_type: custom::attribute_spec::Datatype::from(value.data_type) as i32,
            valueset_type: custom::attribute_spec::Valueset::from(value.valueset_type) as i32,
            id: value.id,
            api_name: value.api_name,
            name: value.name,
            category: value.category,
            multi_valued: value.multi_valued,
            read_only: value.read_only,
            required: value.required,
            built_in: value.built_in,
            uom_family_name: value.uom_family_name,
            list_values: convert_all(value.list_values),
        }
    }
}

impl From<custom::RelationshipSpec> for domain::RelationshipSpec {
    fn from(value: custom::RelationshipSpec) -> Self {
        Self {
            relationship_type: value.r#type().into(),
            attributes: convert_all(value.attributes),
        }
    }
}

impl From<domain::RelationshipSpec> for custom::RelationshipSpec {
    fn from(value: domain::RelationshipSpec) -> Self {
        Self {
            r#type: custom::RelationshipType::from(value.relationship_type) as i32,
            attributes: convert_all(value.attributes),
        }
    }
}

impl From<custom::Type> for domain::Type {
    fn from(value: custom::Type) -> Self {
        Self {
            id: value.id.map(Into::into).unwrap_or_default(),
            attributes: convert_all(value.attributes),
            relationships: convert_all(value.relationships),
        }
    }
}

impl From<domain::Type> for custom::Type {
    fn from(value: domain::Type) -> Self {
        Self {
            id: Some(value.id.into()),
            attributes: convert_all(value.attributes),
            relationships: convert_all(value.relationships),
        }
    }
}

// ============================================================================
// QUERIES AND RELATIONSHIPS
// ============================================================================

impl From<custom::QueryAttribute> for domain::QueryAttribute {
    fn from(value: custom::QueryAttribute) -> Self {
        Self {
            occurrence: value.occurrence().into(),
            name: value.name,
            value: value.value,
        }
    }
}

impl From<custom::Query> for domain::Query {
    fn from(value: custom::Query) -> Self {
        Self {
            type_name: value.r#type,
            attrs: convert_all(value.attrs),
            folder_path: value.folder_path,
            modify_date: value.modify_date,
            max_rows: value.max_rows,
        }
    }
}

impl From<custom::RelationshipRow> for domain::RelationshipRow {
    fn from(value: custom::RelationshipRow) -> Self {
        Self {
            id: value.id,
            child_id: value.child_id.map(Into::into),
            attributes: convert_all(value.attributes),
            file_id: value.file_id,
            file_name: value.file_name,
        }
    }
}

impl From<domain::RelationshipRow> for custom::RelationshipRow {
    fn from(value: domain::RelationshipRow) -> Self {
        Self {
            id: value.id,
            child_id: value.child_id.map(Into::into),
            attributes: convert_all(value.attributes),
            file_id: value.file_id,
            file_name: value.file_name,
        }
    }
}

impl From<custom::RelationshipTable> for domain::RelationshipTable {
    fn from(value: custom::RelationshipTable) -> Self {
        Self {
            relationship_type: value.r#type().into(),
            id: value.id.map(Into::into).unwrap_or_default(),
            red_line_change: value.red_line_change.map(Into::into),
            rows: convert_all(value.rows),
        }
    }
}

impl From<domain::RelationshipTable> for custom::RelationshipTable {
    fn from(value: domain::RelationshipTable) -> Self {
        Self {
            r#type: custom::RelationshipType::from(value.relationship_type) as i32,
            id: Some(value.id.into()),
            red_line_change: value.red_line_change.map(Into::into),
            rows: convert_all(value.rows),
        }
    }
}

/// Build the test-access reply for a service verdict.
pub fn auth_result(granted: bool) -> custom::AuthResult {
    let status = if granted {
        custom::auth_result::Status::Success
    } else {
        custom::auth_result::Status::InvalidCredentials
    };
    custom::AuthResult {
        success: granted,
        status: status as i32,
    }
}
