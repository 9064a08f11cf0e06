//! Notification routing.
//!
//! Turns one inbound [`Request`] into a typed [`UnitOfWork`] by picking the
//! first populated payload slot.

use hybrid_proto::custom;
use hybrid_proto::Request;
use std::fmt;

use crate::error::{AgentError, AgentResult};

/// Operation requested by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    TestAccess,
    AdvanceState,
    IsOperationSupported,
    CreateRelationships,
    ReadRelationships,
    UploadFile,
    CreateItems,
    DeleteItems,
    QueryItems,
    ReadItems,
    UpdateItems,
    ReadTypes,
    ReadTypeIdentifiers,
}

impl OperationKind {
    /// All kinds in routing order.
    pub const ALL: [OperationKind; 13] = [
        OperationKind::TestAccess,
        OperationKind::AdvanceState,
        OperationKind::IsOperationSupported,
        OperationKind::CreateRelationships,
        OperationKind::ReadRelationships,
        OperationKind::UploadFile,
        OperationKind::CreateItems,
        OperationKind::DeleteItems,
        OperationKind::QueryItems,
        OperationKind::ReadItems,
        OperationKind::UpdateItems,
        OperationKind::ReadTypes,
        OperationKind::ReadTypeIdentifiers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::TestAccess => "test_access",
            OperationKind::AdvanceState => "advance_state",
            OperationKind::IsOperationSupported => "is_operation_supported",
            OperationKind::CreateRelationships => "create_relationships",
            OperationKind::ReadRelationships => "read_relationships",
            OperationKind::UploadFile => "upload_file",
            OperationKind::CreateItems => "create_items",
            OperationKind::DeleteItems => "delete_items",
            OperationKind::QueryItems => "query_items",
            OperationKind::ReadItems => "read_items",
            OperationKind::UpdateItems => "update_items",
            OperationKind::ReadTypes => "read_types",
            OperationKind::ReadTypeIdentifiers => "read_type_identifiers",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire payload of a routed request.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    TestAccess(custom::Auth),
    AdvanceState(custom::AdvanceStateRequest),
    IsOperationSupported(custom::OperationSupportedRequest),
    CreateRelationships(custom::CreateRelationshipsRequest),
    ReadRelationships(custom::RelationshipRequest),
    UploadFile(custom::FileResource),
    CreateItems(custom::ItemCreateRequest),
    DeleteItems(custom::IdRequest),
    QueryItems(custom::QueryItemsRequest),
    ReadItems(custom::IdRequest),
    UpdateItems(custom::ItemUpdateRequest),
    ReadTypes(custom::TypeIdRequest),
    ReadTypeIdentifiers(custom::TypeRequest),
}

impl Payload {
    pub fn kind(&self) -> OperationKind {
        match self {
            Payload::TestAccess(_) => OperationKind::TestAccess,
            Payload::AdvanceState(_) => OperationKind::AdvanceState,
            Payload::IsOperationSupported(_) => OperationKind::IsOperationSupported,
            Payload::CreateRelationships(_) => OperationKind::CreateRelationships,
            Payload::ReadRelationships(_) => OperationKind::ReadRelationships,
            Payload::UploadFile(_) => OperationKind::UploadFile,
            Payload::CreateItems(_) => OperationKind::CreateItems,
            Payload::DeleteItems(_) => OperationKind::DeleteItems,
            Payload::QueryItems(_) => OperationKind::QueryItems,
            Payload::ReadItems(_) => OperationKind::ReadItems,
            Payload::UpdateItems(_) => OperationKind::UpdateItems,
            Payload::ReadTypes(_) => OperationKind::ReadTypes,
            Payload::ReadTypeIdentifiers(_) => OperationKind::ReadTypeIdentifiers,
        }
    }
}

/// One routed request, ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitOfWork {
    pub correlation_id: String,
    pub payload: Payload,
}

impl UnitOfWork {
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn kind(&self) -> OperationKind {
        self.payload.kind()
    }
}

macro_rules! first_slot {
    ($request:ident, $($slot:ident => $variant:ident),+ $(,)?) => {
        $(
            if let Some(payload) = $request.$slot.take() {
                return Ok(UnitOfWork {
                    correlation_id: $request.correlation_id,
                    payload: Payload::$variant(payload),
                });
            }
        )+
    };
}

/// Map a request to its unit of work.
///
/// Slots are checked in a fixed order and the first populated one wins. A
/// request with no populated slot fails with [`AgentError::MappingFailed`]
/// carrying the request unchanged.
pub fn route(mut request: Request) -> AgentResult<UnitOfWork> {
    first_slot!(
        request,
        test_access => TestAccess,
        advance_state => AdvanceState,
        is_operation_supported => IsOperationSupported,
        create_relationships => CreateRelationships,
        read_relationships => ReadRelationships,
        upload_file => UploadFile,
        create_items => CreateItems,
        delete_items => DeleteItems,
        query_items => QueryItems,
        read_items => ReadItems,
        update_items => UpdateItems,
        read_types => ReadTypes,
        read_type_identifiers => ReadTypeIdentifiers,
    );

    Err(AgentError::MappingFailed {
        request: Box::new(request),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(user: &str) -> custom::Auth {
        custom::Auth {
            credentials: Some(custom::Credentials {
                username: user.to_string(),
                password: "p".to_string(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_routes_test_access() {
        let request = Request {
            correlation_id: "abc".to_string(),
            test_access: Some(auth("u")),
            ..Default::default()
        };
        let unit = route(request).unwrap();
        assert_eq!(unit.correlation_id(), "abc");
        assert_eq!(unit.kind(), OperationKind::TestAccess);
        assert_eq!(unit.payload, Payload::TestAccess(auth("u")));
    }

    #[test]
    fn test_read_and_delete_items_are_distinguished() {
        let ids = custom::IdRequest {
            data: vec![custom::Id {
                public_id: "P-1".to_string(),
                ..Default::default()
            }],
        };
        let read = route(Request {
            correlation_id: "r".to_string(),
            read_items: Some(ids.clone()),
            ..Default::default()
        })
        .unwrap();
        let delete = route(Request {
            correlation_id: "d".to_string(),
            delete_items: Some(ids.clone()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(read.payload, Payload::ReadItems(ids.clone()));
        assert_eq!(delete.payload, Payload::DeleteItems(ids));
    }

    #[test]
    fn test_empty_request_fails_with_original() {
        let request = Request {
            correlation_id: "empty".to_string(),
            ..Default::default()
        };
        match route(request.clone()) {
            Err(AgentError::MappingFailed { request: failed }) => assert_eq!(*failed, request),
            other => panic!("expected MappingFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_first_populated_slot_wins() {
        let request = Request {
            correlation_id: "multi".to_string(),
            read_type_identifiers: Some(custom::TypeRequest::default()),
            upload_file: Some(custom::FileResource::default()),
            test_access: Some(auth("u")),
            ..Default::default()
        };
        assert_eq!(route(request).unwrap().kind(), OperationKind::TestAccess);
    }

    #[test]
    fn test_kind_names_are_unique() {
        let names: std::collections::HashSet<_> =
            OperationKind::ALL.iter().map(OperationKind::as_str).collect();
        assert_eq!(names.len(), OperationKind::ALL.len());
    }
}
