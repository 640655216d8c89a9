//! Document store collaborator interface.
//!
//! The join engine treats the store purely as a capability: resolve a
//! collection handle by name, and find at most one document matching an
//! equality query. Connection management, query execution, and any lookup
//! indexes live behind these traits; the engine never reaches past them.
//!
//! The module also ships [`MemoryStore`], an in-memory reference
//! implementation of every trait, used by the crate's own tests and handy as
//! a fixture for consumers.

pub mod id;
pub mod memory;
mod traits;

pub use id::{DocumentId, IdParseError, OID_KEY};
pub use memory::{MemoryCollection, MemoryCursor, MemoryEventStream, MemoryStore};
pub use traits::{
    BatchReader, CollectionHandle, DocumentStore, EventReader, FetchOptions, FindOptions,
    ScalarReader, StoreResult,
};

/// The store's reserved primary-key field name.
pub const ID_FIELD: &str = "_id";

/// A schemaless document: a JSON object.
///
/// Cloning a `Document` is a deep copy of the whole JSON tree, which is what
/// the orchestration layer relies on for its private working copies.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Build a [`Document`] from field/value pairs. Test and example convenience.
pub fn document<I, K>(fields: I) -> Document
where
    I: IntoIterator<Item = (K, serde_json::Value)>,
    K: Into<String>,
{
    fields.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
