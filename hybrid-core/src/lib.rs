//! Hybrid Core - PLM Domain Model
//!
//! Data structures exchanged with an external PLM system, the operation
//! service contract the agent calls into, and an in-memory reference driver.
//! Nothing in this crate knows about the hub or its wire format.

mod auth;
mod error;
mod item;
pub mod memory;
mod metadata;
mod query;
mod relationship;
mod service;

pub use auth::{Auth, Credentials, SupportedOperation};
pub use error::{PlmError, PlmResult};
pub use item::{
    AttributeValue, FileResource, Id, Item, ItemCreateSpec, ItemResult, ItemUpdateSpec,
    ListValue, NumberingFormat, UomValue, Value,
};
pub use memory::InMemoryPlm;
pub use metadata::{
    AttributeSpec, BaseType, Datatype, RelationshipSpec, RelationshipType, Type, TypeId, Valueset,
};
pub use query::{Occurrence, Query, QueryAttribute};
pub use relationship::{RelationshipRow, RelationshipTable};
pub use service::{PlmMetadataService, PlmService};
