//! Operation service contract.
//!
//! The agent calls these traits for every request it receives from the hub.
//! Implementations talk to the actual PLM system; `InMemoryPlm` is the
//! reference implementation. Every method receives the cancellation token of
//! the request it serves and should stop work promptly once it fires.

use crate::auth::{Auth, SupportedOperation};
use crate::error::PlmResult;
use crate::item::{FileResource, Id, Item, ItemCreateSpec, ItemResult, ItemUpdateSpec};
use crate::metadata::{BaseType, RelationshipType, Type, TypeId};
use crate::query::Query;
use crate::relationship::RelationshipTable;
use ::async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Business operations on the external PLM system.
#[async_trait]
pub trait PlmService: Send + Sync {
    // ========================================================================
    // ACCESS
    // ========================================================================

    /// Check whether `auth` grants access to the external system.
    async fn test_access(&self, auth: Auth, token: &CancellationToken) -> PlmResult<bool>;

    /// Check whether the external system supports a special operation.
    async fn is_operation_supported(
        &self,
        operation: SupportedOperation,
        token: &CancellationToken,
    ) -> PlmResult<bool>;

    // ========================================================================
    // ITEM OPERATIONS
    // ========================================================================

    /// Create items. Returns exactly one result per spec, in input order.
    async fn create_items(
        &self,
        specs: Vec<ItemCreateSpec>,
        token: &CancellationToken,
    ) -> PlmResult<Vec<ItemResult>>;

    /// Read the items that exist among `ids`.
    async fn read_items(&self, ids: Vec<Id>, token: &CancellationToken) -> PlmResult<Vec<Item>>;

    /// Update items. Returns exactly one result per spec, in input order.
    async fn update_items(
        &self,
        specs: Vec<ItemUpdateSpec>,
        token: &CancellationToken,
    ) -> PlmResult<Vec<ItemResult>>;

    async fn delete_items(&self, ids: Vec<Id>, token: &CancellationToken) -> PlmResult<()>;

    /// Find ids of items of `item_type` matching `query`.
    async fn query_items(
        &self,
        query: Query,
        item_type: Type,
        token: &CancellationToken,
    ) -> PlmResult<Vec<Id>>;

    /// Move an item to its next default lifecycle state.
    async fn advance_state(&self, id: Id, token: &CancellationToken) -> PlmResult<()>;

    /// Store a file and return the id assigned to it.
    async fn upload_file(&self, file: FileResource, token: &CancellationToken) -> PlmResult<String>;

    // ========================================================================
    // RELATIONSHIP OPERATIONS
    // ========================================================================

    async fn create_relationships(
        &self,
        tables: Vec<RelationshipTable>,
        token: &CancellationToken,
    ) -> PlmResult<()>;

    /// Read relationship tables of the given type owned by `ids`.
    async fn read_relationships(
        &self,
        ids: Vec<Id>,
        relationship_type: RelationshipType,
        token: &CancellationToken,
    ) -> PlmResult<Vec<RelationshipTable>>;
}

/// Type metadata of the external PLM system.
#[async_trait]
pub trait PlmMetadataService: Send + Sync {
    /// Type identifiers available for a base type.
    async fn read_type_identifiers(
        &self,
        base_type: BaseType,
        token: &CancellationToken,
    ) -> PlmResult<Vec<TypeId>>;

    /// Full type definitions for the given identifiers.
    async fn read_types(&self, ids: Vec<TypeId>, token: &CancellationToken) -> PlmResult<Vec<Type>>;
}
