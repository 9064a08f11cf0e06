//! Messages and client of the `altium.plm.custom.reverse` package, generated
//! from `proto/reverse.proto`, plus the [`Envelope`] view over the reply
//! messages.

tonic::include_proto!("altium.plm.custom.reverse");

use super::{
    AuthResult, FileResourceResponse, Id, Item, ItemResult, OperationSupportedResponse,
    RelationshipTable, Type, TypeId, Void,
};

/// Reply message carrying the correlation id of the request it answers.
pub trait Envelope: ::prost::Message + Default + Clone + Send + Sync + 'static {
    type Value;

    fn wrap(correlation_id: &str, value: Self::Value) -> Self;

    fn correlation_id(&self) -> &str;

    fn value(&self) -> Option<&Self::Value>;
}

macro_rules! envelope {
    ($($name:ident => $value:ty),+ $(,)?) => {
        $(
            impl Envelope for $name {
                type Value = $value;

                fn wrap(correlation_id: &str, value: $value) -> Self {
                    Self {
                        correlation_id: correlation_id.to_string(),
                        value: Some(value),
                    }
                }

                fn correlation_id(&self) -> &str {
                    &self.correlation_id
                }

                fn value(&self) -> Option<&$value> {
                    self.value.as_ref()
                }
            }
        )+
    };
}

envelope!(
    VoidEx => Void,
    AuthResultEx => AuthResult,
    OperationSupportedResponseEx => OperationSupportedResponse,
    FileResourceResponseEx => FileResourceResponse,
    ItemResultEx => ItemResult,
    ItemEx => Item,
    IdEx => Id,
    RelationshipTableEx => RelationshipTable,
    TypeEx => Type,
    TypeIdEx => TypeId,
);
