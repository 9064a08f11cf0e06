//! In-memory PLM driver.
//!
//! Keeps items, relationship tables, uploaded files and type metadata in
//! process memory. Useful as a reference implementation of the service
//! traits and as the default backend of the agent binary. A JSON seed
//! document can pre-populate types and items:
//!
//! ```json
//! {
//!   "types": [{ "id": { "id": "part", "name": "Part", "api_name": "part", "base_type": "Item" },
//!               "attributes": [], "relationships": [] }],
//!   "items": [],
//!   "supported_operations": ["CreateMfrParts"],
//!   "credentials": { "username": "admin", "password": "secret" }
//! }
//! ```

use crate::auth::{Auth, Credentials, SupportedOperation};
use crate::error::{PlmError, PlmResult};
use crate::item::{
    AttributeValue, FileResource, Id, Item, ItemCreateSpec, ItemResult, ItemUpdateSpec, Value,
};
use crate::metadata::{BaseType, RelationshipType, Type, TypeId};
use crate::query::Query;
use crate::relationship::RelationshipTable;
use crate::service::{PlmMetadataService, PlmService};
use ::async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Attribute holding the lifecycle state of stored items.
pub const LIFECYCLE_ATTRIBUTE: &str = "lifecycle_state";

/// Default lifecycle, in advance order.
pub const LIFECYCLE_STATES: [&str; 4] = ["In Design", "In Review", "Released", "Obsolete"];

// ============================================================================
// SEED
// ============================================================================

/// Initial content of an [`InMemoryPlm`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub types: Vec<Type>,
    pub items: Vec<Item>,
    pub supported_operations: Vec<SupportedOperation>,
    /// Only these credentials pass `test_access`; any non-empty login passes when unset.
    pub credentials: Option<Credentials>,
}

// ============================================================================
// STORE
// ============================================================================

#[derive(Debug, Default)]
struct State {
    items: BTreeMap<String, Item>,
    relationships: HashMap<(String, RelationshipType), RelationshipTable>,
    files: HashMap<String, FileResource>,
    types: Vec<Type>,
}

/// PLM backend held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryPlm {
    state: RwLock<State>,
    credentials: Option<Credentials>,
    supported: HashSet<SupportedOperation>,
    sequence: AtomicU64,
}

impl InMemoryPlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: Seed) -> Self {
        let items = seed
            .items
            .into_iter()
            .map(|item| (item.id.key().to_string(), item))
            .collect();
        Self {
            state: RwLock::new(State {
                items,
                types: seed.types,
                ..State::default()
            }),
            credentials: seed.credentials,
            supported: seed.supported_operations.into_iter().collect(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Parse a JSON seed document.
    pub fn from_json(json: &str) -> PlmResult<Self> {
        let seed: Seed = serde_json::from_str(json).map_err(|e| PlmError::InvalidArgument {
            field: "seed".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_seed(seed))
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_supported_operation(mut self, operation: SupportedOperation) -> Self {
        self.supported.insert(operation);
        self
    }

    pub fn with_type(self, item_type: Type) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.types.push(item_type);
        }
        self
    }

    pub fn item_count(&self) -> usize {
        self.read().map(|s| s.items.len()).unwrap_or_default()
    }

    pub fn file(&self, id: &str) -> Option<FileResource> {
        self.read().ok().and_then(|s| s.files.get(id).cloned())
    }

    fn read(&self) -> PlmResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| PlmError::backend("store lock poisoned"))
    }

    fn write(&self) -> PlmResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| PlmError::backend("store lock poisoned"))
    }

    fn next_public_id(&self, spec: &ItemCreateSpec) -> String {
        match &spec.autonumber {
            Some(format) if !format.id.is_empty() => {
                let n = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
                format!("{}-{n:06}", format.id)
            }
            _ => Uuid::now_v7().simple().to_string(),
        }
    }

    fn create_one(&self, state: &mut State, spec: ItemCreateSpec) -> ItemResult {
        let mut id = match spec.specific_id.clone() {
            Some(id) if !id.public_id.is_empty() => id,
            _ => Id::new(self.next_public_id(&spec)),
        };
        if state.items.contains_key(id.key()) {
            return ItemResult::error(PlmError::AlreadyExists { id: id.public_id }.to_string());
        }
        if id.type_id.is_none() {
            id.type_id = spec.metadata.as_ref().map(|t| t.id.clone());
        }

        let mut item = Item {
            link: format!("memory://items/{}", id.public_id),
            id,
            values: Vec::new(),
        };
        item.apply_values(&spec.values);
        if item.value_of(LIFECYCLE_ATTRIBUTE).is_none() {
            item.values
                .push(AttributeValue::new(LIFECYCLE_ATTRIBUTE, LIFECYCLE_STATES[0]));
        }

        state.items.insert(item.id.key().to_string(), item.clone());
        ItemResult::Item(item)
    }

    fn update_one(state: &mut State, spec: ItemUpdateSpec) -> ItemResult {
        match state.items.get_mut(spec.id.key()) {
            Some(item) => {
                item.apply_values(&spec.values);
                ItemResult::Item(item.clone())
            }
            None => ItemResult::error(PlmError::not_found(spec.id.public_id).to_string()),
        }
    }
}

fn ensure_active(token: &CancellationToken) -> PlmResult<()> {
    if token.is_cancelled() {
        Err(PlmError::Cancelled)
    } else {
        Ok(())
    }
}

fn type_matches(item: &Item, qualifier: &str) -> bool {
    qualifier.is_empty()
        || item
            .id
            .type_id
            .as_ref()
            .is_some_and(|type_id| type_id.matches(qualifier))
}

// ============================================================================
// SERVICE IMPLEMENTATIONS
// ============================================================================

#[async_trait]
impl PlmService for InMemoryPlm {
    async fn test_access(&self, auth: Auth, token: &CancellationToken) -> PlmResult<bool> {
        ensure_active(token)?;
        let granted = match (&self.credentials, &auth.credentials) {
            (Some(expected), Some(given)) => expected == given,
            (Some(_), None) => false,
            (None, Some(given)) => !given.username.is_empty(),
            (None, None) => !auth.auth_token.is_empty(),
        };
        Ok(granted)
    }

    async fn is_operation_supported(
        &self,
        operation: SupportedOperation,
        token: &CancellationToken,
    ) -> PlmResult<bool> {
        ensure_active(token)?;
        Ok(self.supported.contains(&operation))
    }

    async fn create_items(
        &self,
        specs: Vec<ItemCreateSpec>,
        token: &CancellationToken,
    ) -> PlmResult<Vec<ItemResult>> {
        ensure_active(token)?;
        let mut state = self.write()?;
        let results = specs
            .into_iter()
            .map(|spec| self.create_one(&mut state, spec))
            .collect::<Vec<_>>();
        tracing::debug!(count = results.len(), "Created items in memory store");
        Ok(results)
    }

    async fn read_items(&self, ids: Vec<Id>, token: &CancellationToken) -> PlmResult<Vec<Item>> {
        ensure_active(token)?;
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.items.get(id.key()).cloned())
            .collect())
    }

    async fn update_items(
        &self,
        specs: Vec<ItemUpdateSpec>,
        token: &CancellationToken,
    ) -> PlmResult<Vec<ItemResult>> {
        ensure_active(token)?;
        let mut state = self.write()?;
        Ok(specs
            .into_iter()
            .map(|spec| Self::update_one(&mut state, spec))
            .collect())
    }

    async fn delete_items(&self, ids: Vec<Id>, token: &CancellationToken) -> PlmResult<()> {
        ensure_active(token)?;
        let mut state = self.write()?;
        if let Some(missing) = ids.iter().find(|id| !state.items.contains_key(id.key())) {
            return Err(PlmError::not_found(missing.public_id.clone()));
        }
        for id in &ids {
            state.items.remove(id.key());
            state.relationships.retain(|(owner, _), _| owner.as_str() != id.key());
        }
        Ok(())
    }

    async fn query_items(
        &self,
        query: Query,
        item_type: Type,
        token: &CancellationToken,
    ) -> PlmResult<Vec<Id>> {
        ensure_active(token)?;
        let state = self.read()?;
        let matches = state
            .items
            .values()
            .filter(|item| type_matches(item, &query.type_name))
            .filter(|item| type_matches(item, &item_type.id.id))
            .filter(|item| query.matches(item))
            .map(|item| item.id.clone());
        Ok(match query.row_limit() {
            Some(limit) => matches.take(limit).collect(),
            None => matches.collect(),
        })
    }

    async fn advance_state(&self, id: Id, token: &CancellationToken) -> PlmResult<()> {
        ensure_active(token)?;
        let mut state = self.write()?;
        let item = state
            .items
            .get_mut(id.key())
            .ok_or_else(|| PlmError::not_found(id.public_id.clone()))?;

        let current = item
            .value_of(LIFECYCLE_ATTRIBUTE)
            .and_then(Value::as_text)
            .and_then(|s| LIFECYCLE_STATES.iter().position(|state| *state == s))
            .unwrap_or(0);
        let next = LIFECYCLE_STATES
            .get(current + 1)
            .ok_or_else(|| PlmError::InvalidArgument {
                field: LIFECYCLE_ATTRIBUTE.to_string(),
                reason: format!("{} is already in its final state", id.public_id),
            })?;
        item.apply_values(&[AttributeValue::new(LIFECYCLE_ATTRIBUTE, *next)]);
        Ok(())
    }

    async fn upload_file(&self, file: FileResource, token: &CancellationToken) -> PlmResult<String> {
        ensure_active(token)?;
        if file.file_name.is_empty() {
            return Err(PlmError::InvalidArgument {
                field: "file_name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        let id = Uuid::now_v7().to_string();
        self.write()?.files.insert(id.clone(), file);
        Ok(id)
    }

    async fn create_relationships(
        &self,
        tables: Vec<RelationshipTable>,
        token: &CancellationToken,
    ) -> PlmResult<()> {
        ensure_active(token)?;
        let mut state = self.write()?;
        for table in tables {
            state
                .relationships
                .insert((table.id.key().to_string(), table.relationship_type), table);
        }
        Ok(())
    }

    async fn read_relationships(
        &self,
        ids: Vec<Id>,
        relationship_type: RelationshipType,
        token: &CancellationToken,
    ) -> PlmResult<Vec<RelationshipTable>> {
        ensure_active(token)?;
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| {
                state
                    .relationships
                    .get(&(id.key().to_string(), relationship_type))
                    .cloned()
            })
            .collect())
    }
}

#[async_trait]
impl PlmMetadataService for InMemoryPlm {
    async fn read_type_identifiers(
        &self,
        base_type: BaseType,
        token: &CancellationToken,
    ) -> PlmResult<Vec<TypeId>> {
        ensure_active(token)?;
        Ok(self
            .read()?
            .types
            .iter()
            .filter(|t| t.id.base_type == base_type)
            .map(|t| t.id.clone())
            .collect())
    }

    async fn read_types(&self, ids: Vec<TypeId>, token: &CancellationToken) -> PlmResult<Vec<Type>> {
        ensure_active(token)?;
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|wanted| state.types.iter().find(|t| t.id.id == wanted.id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::NumberingFormat;
    use crate::query::{Occurrence, QueryAttribute};

    fn part_type() -> Type {
        Type {
            id: TypeId::new("part", BaseType::Item),
            ..Type::default()
        }
    }

    fn spec_with_id(public_id: &str) -> ItemCreateSpec {
        ItemCreateSpec {
            specific_id: Some(Id::new(public_id)),
            metadata: Some(part_type()),
            values: vec![AttributeValue::new("color", "red")],
            ..ItemCreateSpec::default()
        }
    }

    #[tokio::test]
    async fn test_create_items_reports_duplicates_in_place() {
        let plm = InMemoryPlm::new();
        let token = CancellationToken::new();

        let results = plm
            .create_items(
                vec![spec_with_id("A"), spec_with_id("A"), spec_with_id("B")],
                &token,
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(matches!(&results[0], ItemResult::Item(item) if item.id.public_id == "A"));
        assert_eq!(results[1], ItemResult::error("Item already exists: A"));
        assert!(matches!(&results[2], ItemResult::Item(item) if item.id.public_id == "B"));
        assert_eq!(plm.item_count(), 2);
    }

    #[tokio::test]
    async fn test_autonumber_generates_sequential_ids() {
        let plm = InMemoryPlm::new();
        let spec = ItemCreateSpec {
            autonumber: Some(NumberingFormat {
                id: "PRT".into(),
                ..NumberingFormat::default()
            }),
            ..ItemCreateSpec::default()
        };

        let results = plm
            .create_items(vec![spec.clone(), spec], &CancellationToken::new())
            .await
            .unwrap();

        let ids: Vec<_> = results
            .iter()
            .filter_map(|r| match r {
                ItemResult::Item(item) => Some(item.id.public_id.clone()),
                ItemResult::Error(_) => None,
            })
            .collect();
        assert_eq!(ids, vec!["PRT-000001", "PRT-000002"]);
    }

    #[tokio::test]
    async fn test_update_missing_item_is_item_error() {
        let plm = InMemoryPlm::new();
        let token = CancellationToken::new();
        plm.create_items(vec![spec_with_id("A")], &token).await.unwrap();

        let results = plm
            .update_items(
                vec![
                    ItemUpdateSpec {
                        id: Id::new("A"),
                        values: vec![AttributeValue::new("color", "blue")],
                        metadata: None,
                    },
                    ItemUpdateSpec {
                        id: Id::new("missing"),
                        ..ItemUpdateSpec::default()
                    },
                ],
                &token,
            )
            .await
            .unwrap();

        match &results[0] {
            ItemResult::Item(item) => assert_eq!(item.value_of("color"), Some(&Value::from("blue"))),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(results[1], ItemResult::error("Item not found: missing"));
    }

    #[tokio::test]
    async fn test_query_filters_by_type_attrs_and_limit() {
        let plm = InMemoryPlm::new();
        let token = CancellationToken::new();
        plm.create_items(
            vec![spec_with_id("A"), spec_with_id("B"), spec_with_id("C")],
            &token,
        )
        .await
        .unwrap();

        let query = Query {
            type_name: "part".into(),
            attrs: vec![QueryAttribute {
                name: "color".into(),
                value: "red".into(),
                occurrence: Occurrence::Must,
            }],
            max_rows: 2,
            ..Query::default()
        };
        let ids = plm.query_items(query, part_type(), &token).await.unwrap();
        assert_eq!(ids.len(), 2);

        let none = Query {
            type_name: "capacitor".into(),
            ..Query::default()
        };
        assert!(plm.query_items(none, Type::default(), &token).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_advance_state_walks_lifecycle() {
        let plm = InMemoryPlm::new();
        let token = CancellationToken::new();
        plm.create_items(vec![spec_with_id("A")], &token).await.unwrap();

        for _ in 1..LIFECYCLE_STATES.len() {
            plm.advance_state(Id::new("A"), &token).await.unwrap();
        }
        let items = plm.read_items(vec![Id::new("A")], &token).await.unwrap();
        assert_eq!(
            items[0].value_of(LIFECYCLE_ATTRIBUTE),
            Some(&Value::from("Obsolete"))
        );

        let err = plm.advance_state(Id::new("A"), &token).await.unwrap_err();
        assert!(matches!(err, PlmError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_delete_unknown_item_fails_without_side_effects() {
        let plm = InMemoryPlm::new();
        let token = CancellationToken::new();
        plm.create_items(vec![spec_with_id("A")], &token).await.unwrap();

        let err = plm
            .delete_items(vec![Id::new("A"), Id::new("ghost")], &token)
            .await
            .unwrap_err();
        assert_eq!(err, PlmError::not_found("ghost"));
        assert_eq!(plm.item_count(), 1);
    }

    #[tokio::test]
    async fn test_test_access_with_configured_credentials() {
        let expected = Credentials {
            username: "u".into(),
            password: "p".into(),
        };
        let plm = InMemoryPlm::new().with_credentials(expected.clone());
        let token = CancellationToken::new();

        let ok = Auth {
            credentials: Some(expected),
            ..Auth::default()
        };
        let bad = Auth {
            credentials: Some(Credentials {
                username: "u".into(),
                password: "wrong".into(),
            }),
            ..Auth::default()
        };
        assert!(plm.test_access(ok, &token).await.unwrap());
        assert!(!plm.test_access(bad, &token).await.unwrap());
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let plm = InMemoryPlm::new();
        let token = CancellationToken::new();
        token.cancel();
        let err = plm.read_items(vec![], &token).await.unwrap_err();
        assert_eq!(err, PlmError::Cancelled);
    }

    #[tokio::test]
    async fn test_seed_from_json() {
        let plm = InMemoryPlm::from_json(
            r#"{
                "types": [{"id": {"id": "eco", "name": "ECO", "api_name": "eco", "base_type": "Change"}}],
                "supported_operations": ["CreateMfrParts"]
            }"#,
        )
        .unwrap();
        let token = CancellationToken::new();

        let changes = plm
            .read_type_identifiers(BaseType::Change, &token)
            .await
            .unwrap();
        assert_eq!(changes.len(), 1);
        assert!(plm
            .is_operation_supported(SupportedOperation::CreateMfrParts, &token)
            .await
            .unwrap());
        assert!(!plm
            .is_operation_supported(SupportedOperation::CreateChangeOrder, &token)
            .await
            .unwrap());
    }
}
