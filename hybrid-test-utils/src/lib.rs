//! Hybrid Agent Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - A scripted PLM service that records every call
//! - Proptest generators for hub requests
//! - Fixtures for common requests and domain values

// Re-export core types for convenience
pub use hybrid_core::{
    Auth, BaseType, Credentials, FileResource, Id, InMemoryPlm, Item, ItemCreateSpec, ItemResult,
    ItemUpdateSpec, PlmError, PlmMetadataService, PlmResult, PlmService, Query, RelationshipTable,
    RelationshipType, SupportedOperation, Type, TypeId,
};
pub use hybrid_proto::{custom, Request};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ============================================================================
// SCRIPTED SERVICE
// ============================================================================

/// A call received by [`ScriptedPlm`], with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum PlmCall {
    TestAccess(Auth),
    IsOperationSupported(SupportedOperation),
    CreateItems(Vec<ItemCreateSpec>),
    ReadItems(Vec<Id>),
    UpdateItems(Vec<ItemUpdateSpec>),
    DeleteItems(Vec<Id>),
    QueryItems(Query, Type),
    AdvanceState(Id),
    UploadFile(FileResource),
    CreateRelationships(Vec<RelationshipTable>),
    ReadRelationships(Vec<Id>, RelationshipType),
    ReadTypeIdentifiers(BaseType),
    ReadTypes(Vec<TypeId>),
}

impl PlmCall {
    /// Operation name, matching the agent's operation kinds.
    pub fn operation(&self) -> &'static str {
        match self {
            PlmCall::TestAccess(_) => "test_access",
            PlmCall::IsOperationSupported(_) => "is_operation_supported",
            PlmCall::CreateItems(_) => "create_items",
            PlmCall::ReadItems(_) => "read_items",
            PlmCall::UpdateItems(_) => "update_items",
            PlmCall::DeleteItems(_) => "delete_items",
            PlmCall::QueryItems(..) => "query_items",
            PlmCall::AdvanceState(_) => "advance_state",
            PlmCall::UploadFile(_) => "upload_file",
            PlmCall::CreateRelationships(_) => "create_relationships",
            PlmCall::ReadRelationships(..) => "read_relationships",
            PlmCall::ReadTypeIdentifiers(_) => "read_type_identifiers",
            PlmCall::ReadTypes(_) => "read_types",
        }
    }
}

/// PLM service with canned answers.
///
/// Every call is recorded. Answers default to success: batch operations
/// echo one item per input, reads return whatever was scripted. Failures,
/// panics, delays and holds can be scripted per operation name.
#[derive(Default)]
pub struct ScriptedPlm {
    calls: Mutex<Vec<PlmCall>>,
    deny_access: bool,
    operation_supported: bool,
    item_results: Option<Vec<ItemResult>>,
    items: Vec<Item>,
    query_ids: Vec<Id>,
    relationships: Vec<RelationshipTable>,
    types: Vec<Type>,
    type_ids: Vec<TypeId>,
    upload_id: String,
    failures: HashMap<&'static str, PlmError>,
    panics: Vec<&'static str>,
    delay: Option<Duration>,
    hold: Option<CancellationToken>,
}

impl ScriptedPlm {
    pub fn new() -> Self {
        Self {
            upload_id: "file-1".to_string(),
            ..Self::default()
        }
    }

    /// `test_access` answers `false`.
    pub fn deny_access(mut self) -> Self {
        self.deny_access = true;
        self
    }

    pub fn supporting_operations(mut self) -> Self {
        self.operation_supported = true;
        self
    }

    /// Results returned by create and update, regardless of input count.
    pub fn with_item_results(mut self, results: Vec<ItemResult>) -> Self {
        self.item_results = Some(results);
        self
    }

    pub fn with_items(mut self, items: Vec<Item>) -> Self {
        self.items = items;
        self
    }

    pub fn with_query_ids(mut self, ids: Vec<Id>) -> Self {
        self.query_ids = ids;
        self
    }

    pub fn with_relationships(mut self, tables: Vec<RelationshipTable>) -> Self {
        self.relationships = tables;
        self
    }

    pub fn with_types(mut self, types: Vec<Type>) -> Self {
        self.types = types;
        self
    }

    pub fn with_type_ids(mut self, type_ids: Vec<TypeId>) -> Self {
        self.type_ids = type_ids;
        self
    }

    pub fn with_upload_id(mut self, id: impl Into<String>) -> Self {
        self.upload_id = id.into();
        self
    }

    /// Fail every call of `operation` with `error`.
    pub fn failing(mut self, operation: &'static str, error: PlmError) -> Self {
        self.failures.insert(operation, error);
        self
    }

    /// Panic on every call of `operation`.
    pub fn panicking(mut self, operation: &'static str) -> Self {
        self.panics.push(operation);
        self
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Block each call until `release` is cancelled.
    pub fn held_until(mut self, release: CancellationToken) -> Self {
        self.hold = Some(release);
        self
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<PlmCall> {
        self.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    /// Wait until at least `count` calls were received.
    pub async fn wait_for_calls(&self, count: usize) {
        while self.call_count() < count {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PlmCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn enter(&self, call: PlmCall, token: &CancellationToken) -> PlmResult<()> {
        let operation = call.operation();
        self.lock().push(call);

        if self.panics.contains(&operation) {
            panic!("scripted panic in {operation}");
        }
        if let Some(release) = &self.hold {
            tokio::select! {
                _ = token.cancelled() => return Err(PlmError::Cancelled),
                _ = release.cancelled() => {}
            }
        }
        if let Some(delay) = self.delay {
            tokio::select! {
                _ = token.cancelled() => return Err(PlmError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
        match self.failures.get(operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn echo<T>(&self, inputs: &[T], id: impl Fn(usize, &T) -> Id) -> Vec<ItemResult> {
        match &self.item_results {
            Some(results) => results.clone(),
            None => inputs
                .iter()
                .enumerate()
                .map(|(position, input)| {
                    ItemResult::Item(Item {
                        id: id(position, input),
                        ..Default::default()
                    })
                })
                .collect(),
        }
    }
}

#[async_trait]
impl PlmService for ScriptedPlm {
    async fn test_access(&self, auth: Auth, token: &CancellationToken) -> PlmResult<bool> {
        self.enter(PlmCall::TestAccess(auth), token).await?;
        Ok(!self.deny_access)
    }

    async fn is_operation_supported(
        &self,
        operation: SupportedOperation,
        token: &CancellationToken,
    ) -> PlmResult<bool> {
        self.enter(PlmCall::IsOperationSupported(operation), token).await?;
        Ok(self.operation_supported)
    }

    async fn create_items(
        &self,
        specs: Vec<ItemCreateSpec>,
        token: &CancellationToken,
    ) -> PlmResult<Vec<ItemResult>> {
        self.enter(PlmCall::CreateItems(specs.clone()), token).await?;
        Ok(self.echo(&specs, |position, spec| {
            spec.specific_id
                .clone()
                .unwrap_or_else(|| Id::new(format!("NEW-{position}")))
        }))
    }

    async fn read_items(&self, ids: Vec<Id>, token: &CancellationToken) -> PlmResult<Vec<Item>> {
        self.enter(PlmCall::ReadItems(ids), token).await?;
        Ok(self.items.clone())
    }

    async fn update_items(
        &self,
        specs: Vec<ItemUpdateSpec>,
        token: &CancellationToken,
    ) -> PlmResult<Vec<ItemResult>> {
        self.enter(PlmCall::UpdateItems(specs.clone()), token).await?;
        Ok(self.echo(&specs, |_, spec| spec.id.clone()))
    }

    async fn delete_items(&self, ids: Vec<Id>, token: &CancellationToken) -> PlmResult<()> {
        self.enter(PlmCall::DeleteItems(ids), token).await
    }

    async fn query_items(
        &self,
        query: Query,
        item_type: Type,
        token: &CancellationToken,
    ) -> PlmResult<Vec<Id>> {
        self.enter(PlmCall::QueryItems(query, item_type), token).await?;
        Ok(self.query_ids.clone())
    }

    async fn advance_state(&self, id: Id, token: &CancellationToken) -> PlmResult<()> {
        self.enter(PlmCall::AdvanceState(id), token).await
    }

    async fn upload_file(&self, file: FileResource, token: &CancellationToken) -> PlmResult<String> {
        self.enter(PlmCall::UploadFile(file), token).await?;
        Ok(self.upload_id.clone())
    }

    async fn create_relationships(
        &self,
        tables: Vec<RelationshipTable>,
        token: &CancellationToken,
    ) -> PlmResult<()> {
        self.enter(PlmCall::CreateRelationships(tables), token).await
    }

    async fn read_relationships(
        &self,
        ids: Vec<Id>,
        relationship_type: RelationshipType,
        token: &CancellationToken,
    ) -> PlmResult<Vec<RelationshipTable>> {
        self.enter(PlmCall::ReadRelationships(ids, relationship_type), token)
            .await?;
        Ok(self.relationships.clone())
    }
}

#[async_trait]
impl PlmMetadataService for ScriptedPlm {
    async fn read_type_identifiers(
        &self,
        base_type: BaseType,
        token: &CancellationToken,
    ) -> PlmResult<Vec<TypeId>> {
        self.enter(PlmCall::ReadTypeIdentifiers(base_type), token).await?;
        Ok(self.type_ids.clone())
    }

    async fn read_types(&self, ids: Vec<TypeId>, token: &CancellationToken) -> PlmResult<Vec<Type>> {
        self.enter(PlmCall::ReadTypes(ids), token).await?;
        Ok(self.types.clone())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for hub requests and their payloads.

    use super::custom;
    use super::Request;
    use proptest::prelude::*;

    /// Generate a correlation id.
    pub fn arb_correlation_id() -> impl Strategy<Value = String> {
        "[a-z0-9]{8}-[a-z0-9]{4}"
    }

    /// Generate a wire item id.
    pub fn arb_id() -> impl Strategy<Value = custom::Id> {
        ("[A-Z]{2,4}-[0-9]{1,6}", "[a-f0-9]{0,12}").prop_map(|(public_id, private_id)| {
            custom::Id {
                public_id,
                private_id,
                type_id: None,
            }
        })
    }

    pub fn arb_ids() -> impl Strategy<Value = Vec<custom::Id>> {
        prop::collection::vec(arb_id(), 0..5)
    }

    /// Generate a text attribute value.
    pub fn arb_attribute_value() -> impl Strategy<Value = custom::AttributeValue> {
        ("[a-z_]{1,12}", "[A-Za-z0-9 ]{0,24}").prop_map(|(attribute_id, text)| {
            custom::AttributeValue {
                attribute_id,
                value: Some(custom::Value {
                    typed_value: Some(custom::value::TypedValue::StringValue(text)),
                }),
            }
        })
    }

    pub fn arb_auth() -> impl Strategy<Value = custom::Auth> {
        ("[a-z]{1,10}", "[A-Za-z0-9]{0,16}", "[a-z0-9]{0,16}").prop_map(
            |(username, password, auth_token)| custom::Auth {
                credentials: Some(custom::Credentials { username, password }),
                auth_token,
                ..Default::default()
            },
        )
    }

    pub fn arb_type_id() -> impl Strategy<Value = custom::TypeId> {
        ("[a-z]{1,10}", 0i32..2).prop_map(|(id, base_type)| custom::TypeId {
            name: id.clone(),
            api_name: id.clone(),
            id,
            base_type,
        })
    }

    pub fn arb_item_create_request() -> impl Strategy<Value = custom::ItemCreateRequest> {
        prop::collection::vec(prop::collection::vec(arb_attribute_value(), 0..4), 0..5).prop_map(
            |specs| custom::ItemCreateRequest {
                data: specs
                    .into_iter()
                    .map(|values| custom::ItemCreateSpec {
                        values,
                        ..Default::default()
                    })
                    .collect(),
            },
        )
    }

    pub fn arb_item_update_request() -> impl Strategy<Value = custom::ItemUpdateRequest> {
        prop::collection::vec((arb_id(), prop::collection::vec(arb_attribute_value(), 0..4)), 0..5)
            .prop_map(|specs| custom::ItemUpdateRequest {
                data: specs
                    .into_iter()
                    .map(|(id, values)| custom::ItemUpdateSpec {
                        id: Some(id),
                        values,
                        metadata: None,
                    })
                    .collect(),
            })
    }

    pub fn arb_query_items_request() -> impl Strategy<Value = custom::QueryItemsRequest> {
        ("[a-z]{0,10}", 0i64..100).prop_map(|(type_name, max_rows)| custom::QueryItemsRequest {
            query: Some(custom::Query {
                r#type: type_name,
                max_rows,
                ..Default::default()
            }),
            r#type: None,
        })
    }

    pub fn arb_relationship_table() -> impl Strategy<Value = custom::RelationshipTable> {
        (arb_id(), 0i32..4, prop::collection::vec(arb_id(), 0..3)).prop_map(
            |(id, relationship_type, children)| custom::RelationshipTable {
                id: Some(id),
                r#type: relationship_type,
                red_line_change: None,
                rows: children
                    .into_iter()
                    .enumerate()
                    .map(|(row, child)| custom::RelationshipRow {
                        id: format!("row-{row}"),
                        child_id: Some(child),
                        ..Default::default()
                    })
                    .collect(),
            },
        )
    }

    fn with_slot<S, F>(payload: S, slot: &'static str, fill: F) -> impl Strategy<Value = (Request, &'static str)>
    where
        S: Strategy,
        F: Fn(&mut Request, S::Value) + Clone,
    {
        (arb_correlation_id(), payload).prop_map(move |(correlation_id, value)| {
            let mut request = Request {
                correlation_id,
                ..Default::default()
            };
            fill(&mut request, value);
            (request, slot)
        })
    }

    /// Generate a request with exactly one populated slot, paired with the
    /// slot's operation name.
    pub fn arb_single_slot_request() -> impl Strategy<Value = (Request, &'static str)> {
        let first = prop_oneof![
            with_slot(arb_auth(), "test_access", |r, p| r.test_access = Some(p)),
            with_slot(prop::option::of(arb_id()), "advance_state", |r, id| {
                r.advance_state = Some(custom::AdvanceStateRequest { id })
            }),
            with_slot(0i32..7, "is_operation_supported", |r, operation| {
                r.is_operation_supported = Some(custom::OperationSupportedRequest { operation })
            }),
            with_slot(
                prop::collection::vec(arb_relationship_table(), 0..3),
                "create_relationships",
                |r, relationships| {
                    r.create_relationships =
                        Some(custom::CreateRelationshipsRequest { relationships })
                }
            ),
            with_slot((arb_ids(), 0i32..4), "read_relationships", |r, (ids, kind)| {
                r.read_relationships = Some(custom::RelationshipRequest { ids, r#type: kind })
            }),
            with_slot(
                ("[a-z]{1,8}\\.[a-z]{3}", prop::collection::vec(any::<u8>(), 0..64)),
                "upload_file",
                |r, (file_name, data)| {
                    r.upload_file = Some(custom::FileResource { file_name, data })
                }
            ),
            with_slot(arb_item_create_request(), "create_items", |r, p| {
                r.create_items = Some(p)
            }),
        ];
        let second = prop_oneof![
            with_slot(arb_ids(), "delete_items", |r, data| {
                r.delete_items = Some(custom::IdRequest { data })
            }),
            with_slot(arb_query_items_request(), "query_items", |r, p| {
                r.query_items = Some(p)
            }),
            with_slot(arb_ids(), "read_items", |r, data| {
                r.read_items = Some(custom::IdRequest { data })
            }),
            with_slot(arb_item_update_request(), "update_items", |r, p| {
                r.update_items = Some(p)
            }),
            with_slot(prop::collection::vec(arb_type_id(), 0..4), "read_types", |r, data| {
                r.read_types = Some(custom::TypeIdRequest { data })
            }),
            with_slot(0i32..2, "read_type_identifiers", |r, base_type| {
                r.read_type_identifiers = Some(custom::TypeRequest { base_type })
            }),
        ];
        prop_oneof![7 => first, 6 => second]
    }

    /// Generate a request with no populated slot.
    pub fn arb_empty_request() -> impl Strategy<Value = Request> {
        arb_correlation_id().prop_map(|correlation_id| Request {
            correlation_id,
            ..Default::default()
        })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Ready-made requests and domain values.

    use super::{custom, Id, Item, ItemResult, Request};

    /// Auth payload with username/password credentials.
    pub fn auth(username: &str, password: &str) -> custom::Auth {
        custom::Auth {
            credentials: Some(custom::Credentials {
                username: username.to_string(),
                password: password.to_string(),
            }),
            ..Default::default()
        }
    }

    pub fn test_access_request(correlation_id: &str, username: &str, password: &str) -> Request {
        Request {
            correlation_id: correlation_id.to_string(),
            test_access: Some(auth(username, password)),
            ..Default::default()
        }
    }

    /// Create spec with a single `name` attribute.
    pub fn create_spec(name: &str) -> custom::ItemCreateSpec {
        custom::ItemCreateSpec {
            values: vec![custom::AttributeValue {
                attribute_id: "name".to_string(),
                value: Some(custom::Value {
                    typed_value: Some(custom::value::TypedValue::StringValue(name.to_string())),
                }),
            }],
            ..Default::default()
        }
    }

    pub fn create_items_request(correlation_id: &str, names: &[&str]) -> Request {
        Request {
            correlation_id: correlation_id.to_string(),
            create_items: Some(custom::ItemCreateRequest {
                data: names.iter().map(|name| create_spec(name)).collect(),
            }),
            ..Default::default()
        }
    }

    pub fn read_items_request(correlation_id: &str, ids: &[&str]) -> Request {
        Request {
            correlation_id: correlation_id.to_string(),
            read_items: Some(custom::IdRequest {
                data: ids.iter().map(|id| wire_id(id)).collect(),
            }),
            ..Default::default()
        }
    }

    pub fn wire_id(public_id: &str) -> custom::Id {
        custom::Id {
            public_id: public_id.to_string(),
            ..Default::default()
        }
    }

    pub fn item(public_id: &str) -> Item {
        Item {
            id: Id::new(public_id),
            ..Default::default()
        }
    }

    pub fn ok_result(public_id: &str) -> ItemResult {
        ItemResult::Item(item(public_id))
    }
}
